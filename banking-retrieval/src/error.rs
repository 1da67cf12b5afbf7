//! Retrieval-worker error kind (§7 `RetrievalError`). Recovered locally
//! by the worker — §4.5's failure semantics say this never surfaces as
//! an `Err` to the driver; the variants exist so the worker's internal
//! degradation logic has something to match on and log.

use thiserror::Error;

/// Why a retrieval attempt degraded to an apology string.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The corpus/index was never built (startup misconfiguration, or
    /// the worker was constructed without one).
    #[error("knowledge base corpus is not ready")]
    CorpusNotReady,
    /// A retriever or the synthesis LLM call failed.
    #[error("retrieval failed: {0}")]
    RetrievalException(String),
}
