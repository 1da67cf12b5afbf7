#![deny(missing_docs)]
//! In-memory implementation of `banking_protocol::StateStore`, plus a
//! typed `SessionStore` wrapper over `ConversationState`.
//!
//! `MemoryStore` uses a `HashMap` behind a `RwLock` for concurrent
//! access. Keys are namespaced per session, giving full session
//! isolation. Search always returns empty — no semantic search in the
//! in-memory backend (the QA worker's retrieval is a separate concern,
//! see `banking-retrieval`).

use async_trait::async_trait;
use banking_protocol::error::StateError;
use banking_protocol::id::SessionId;
use banking_protocol::state::{SearchResult, StateStore};
use banking_types::ConversationState;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory state store backed by a `HashMap` behind a `RwLock`.
///
/// Suitable for testing, prototyping, and single-process deployments
/// where persistence across restarts is not required. A session's
/// transport layer is responsible for choosing a durable backend if one
/// is needed — this crate only provides the ephemeral default.
pub struct MemoryStore {
    data: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a composite key from session + key to ensure isolation.
fn composite_key(session: &SessionId, key: &str) -> String {
    format!("{}\0{key}", session.as_str())
}

fn extract_key<'a>(composite: &'a str, session_prefix: &str) -> Option<&'a str> {
    composite
        .strip_prefix(session_prefix)
        .and_then(|rest| rest.strip_prefix('\0'))
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn read(
        &self,
        session: &SessionId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StateError> {
        let ck = composite_key(session, key);
        let data = self.data.read().await;
        Ok(data.get(&ck).cloned())
    }

    async fn write(
        &self,
        session: &SessionId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), StateError> {
        let ck = composite_key(session, key);
        let mut data = self.data.write().await;
        data.insert(ck, value);
        Ok(())
    }

    async fn delete(&self, session: &SessionId, key: &str) -> Result<(), StateError> {
        let ck = composite_key(session, key);
        let mut data = self.data.write().await;
        data.remove(&ck);
        Ok(())
    }

    async fn list(&self, session: &SessionId, prefix: &str) -> Result<Vec<String>, StateError> {
        let session_prefix = session.as_str().to_string();
        let data = self.data.read().await;
        let keys = data
            .keys()
            .filter_map(|ck| {
                extract_key(ck, &session_prefix).and_then(|k| {
                    if k.starts_with(prefix) {
                        Some(k.to_string())
                    } else {
                        None
                    }
                })
            })
            .collect();
        Ok(keys)
    }

    async fn search(
        &self,
        _session: &SessionId,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<SearchResult>, StateError> {
        Ok(vec![])
    }
}

/// The single key under which the full `ConversationState` is stored in
/// a session's scope.
const CONVERSATION_STATE_KEY: &str = "conversation_state";

/// Typed session-state read/write, wrapping any `StateStore` (§6: "a
/// session store is a minimal `get(session_id)`/`put(session_id, state)`
/// pair").
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the session's conversation state, or a fresh default if this
    /// is the session's first turn.
    async fn get(&self, session: &SessionId) -> Result<ConversationState, StateError>;

    /// Persist the session's conversation state, overwriting any prior
    /// value. Called exactly once per turn, at commit time (§5: "turn
    /// N's committed state is the starting state for turn N+1").
    async fn put(&self, session: &SessionId, state: &ConversationState) -> Result<(), StateError>;
}

#[async_trait]
impl<T: StateStore> SessionStore for T {
    async fn get(&self, session: &SessionId) -> Result<ConversationState, StateError> {
        match self.read(session, CONVERSATION_STATE_KEY).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| StateError::Serialization(e.to_string())),
            None => Ok(ConversationState::new()),
        }
    }

    async fn put(&self, session: &SessionId, state: &ConversationState) -> Result<(), StateError> {
        let value = serde_json::to_value(state).map_err(|e| StateError::Serialization(e.to_string()))?;
        self.write(session, CONVERSATION_STATE_KEY, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_types::CollectedValue;

    #[tokio::test]
    async fn round_trips_conversation_state() {
        let store = MemoryStore::new();
        let session = SessionId::new("sess-1");

        let mut state = ConversationState::new();
        state
            .collected_info
            .insert("name".into(), CollectedValue::Text("김민준".into()));
        store.put(&session, &state).await.unwrap();

        let loaded = store.get(&session).await.unwrap();
        assert_eq!(loaded.collected_info.len(), 1);
    }

    #[tokio::test]
    async fn fresh_session_yields_default_state() {
        let store = MemoryStore::new();
        let session = SessionId::new("sess-new");
        let loaded = store.get(&session).await.unwrap();
        assert!(loaded.collected_info.is_empty());
        assert!(loaded.current_product_type.is_none());
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = MemoryStore::new();
        let a = SessionId::new("a");
        let b = SessionId::new("b");

        let mut state_a = ConversationState::new();
        state_a.current_scenario_stage_id = Some("ask_name".into());
        store.put(&a, &state_a).await.unwrap();

        let loaded_b = store.get(&b).await.unwrap();
        assert!(loaded_b.current_scenario_stage_id.is_none());
    }
}
