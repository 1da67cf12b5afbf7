//! The State protocol — how `ConversationState` persists and is retrieved
//! across turns.

use crate::{error::StateError, id::SessionId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How session state persists and is retrieved across turns.
///
/// Implementations:
/// - `MemoryStore` (crate `banking-state`): `HashMap` behind an `RwLock`,
///   for testing and single-process deployments.
/// - A Redis- or Postgres-backed store, for a multi-process deployment
///   (out of scope for this crate — the transport layer owns that choice).
///
/// The trait is deliberately minimal — CRUD + list. There is no
/// compaction or versioning here; `ConversationState` is small and
/// always written in full.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a value by key within a session's scope.
    /// Returns `None` if the key doesn't exist.
    async fn read(
        &self,
        session: &SessionId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StateError>;

    /// Write a value. Creates or overwrites.
    async fn write(
        &self,
        session: &SessionId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), StateError>;

    /// Delete a value. No-op if the key doesn't exist.
    async fn delete(&self, session: &SessionId, key: &str) -> Result<(), StateError>;

    /// List keys under a prefix within a session's scope.
    async fn list(&self, session: &SessionId, prefix: &str) -> Result<Vec<String>, StateError>;

    /// Free-text search within a session's scope. Returns matching keys
    /// with relevance scores. Implementations that don't support search
    /// return an empty vec (not an error).
    async fn search(
        &self,
        session: &SessionId,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StateError>;
}

/// A search result from a state-store query.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The key that matched.
    pub key: String,
    /// Relevance score (higher is more relevant).
    pub score: f64,
    /// Preview/snippet of the matched content.
    pub snippet: Option<String>,
}

impl SearchResult {
    /// Create a new search result.
    pub fn new(key: impl Into<String>, score: f64) -> Self {
        Self {
            key: key.into(),
            score,
            snippet: None,
        }
    }
}

/// Read-only view of state. The turn driver reads through this during
/// context assembly; only the driver itself writes back the merged
/// `ConversationState` at the end of a turn.
///
/// This trait exists to enforce the read/write asymmetry at the type
/// level — a worker receives `&dyn StateReader`, never `&dyn StateStore`.
#[async_trait]
pub trait StateReader: Send + Sync {
    /// Read a value by key within a session's scope.
    async fn read(
        &self,
        session: &SessionId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StateError>;

    /// List keys under a prefix within a session's scope.
    async fn list(&self, session: &SessionId, prefix: &str) -> Result<Vec<String>, StateError>;

    /// Free-text search within a session's scope.
    async fn search(
        &self,
        session: &SessionId,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StateError>;
}

/// Blanket implementation: every `StateStore` is a `StateReader`.
#[async_trait]
impl<T: StateStore> StateReader for T {
    async fn read(
        &self,
        session: &SessionId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StateError> {
        StateStore::read(self, session, key).await
    }

    async fn list(&self, session: &SessionId, prefix: &str) -> Result<Vec<String>, StateError> {
        StateStore::list(self, session, prefix).await
    }

    async fn search(
        &self,
        session: &SessionId,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, StateError> {
        StateStore::search(self, session, query, limit).await
    }
}
