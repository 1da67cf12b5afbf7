#![deny(missing_docs)]
//! Retrieval-augmented QA worker (C5): recursive-character chunking,
//! query expansion, hybrid BM25 + dense retrieval, and citation-free
//! answer synthesis, registered as `qa_agent` (§4.5).

pub mod bm25_index;
pub mod chunker;
pub mod dense;
pub mod error;
pub mod expansion;
pub mod hybrid;
pub mod synthesis;
pub mod worker;

pub use chunker::{chunk_corpus, Chunk};
pub use dense::{EmbeddingError, EmbeddingProvider, InMemoryCosineIndex};
pub use error::RetrievalError;
pub use worker::RetrievalWorker;
