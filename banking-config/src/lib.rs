//! Startup loaders that turn on-disk scenario JSON, prompt YAML, and
//! knowledge-base markdown into the immutable, `Arc`-shared singletons
//! the rest of the engine is built on (§1.1, §7).
//!
//! Every error here is fatal: these loaders run once at process
//! startup, and a bad config file should stop the process rather than
//! surface as a per-turn error.

#![deny(missing_docs)]

pub mod corpus_loader;
pub mod error;
pub mod prompt_loader;
pub mod scenario_loader;

pub use corpus_loader::CorpusDocument;
pub use error::ConfigError;
pub use prompt_loader::PromptSet;
