#![deny(missing_docs)]
//! Worker interface and registry for the banking dialogue engine.
//!
//! Defines the [`WorkerDyn`] trait for object-safe worker abstraction and
//! [`WorkerRegistry`] for managing the C2-C5 workers the turn driver
//! dispatches by name. A worker never mutates session state directly —
//! it receives a read-only snapshot and returns a [`WorkerOutput`]
//! carrying a sparse patch, which the driver merges after the call
//! returns (§3: "Turn receives snapshot, returns effects").

use async_trait::async_trait;
use banking_types::ConversationPatch;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors from worker dispatch and execution.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The action plan named a worker not present in the registry.
    #[error("worker not found: {0}")]
    NotFound(String),

    /// The worker ran but failed to produce a usable result.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The input handed to the worker didn't match what it expected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Catch-all, usually wrapping a downstream crate's own error type.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// What a worker call produces: a state patch plus a worker-specific
/// payload the driver interprets by worker name (the QA worker's answer
/// text, the NLU worker's entity map, ...).
#[derive(Debug, Clone, Default)]
pub struct WorkerOutput {
    /// Sparse diff to merge into the session's `ConversationState`.
    pub patch: ConversationPatch,
    /// Worker-specific payload, opaque to the registry and the driver's
    /// dispatch loop, read by whichever call site knows this worker's
    /// shape.
    pub payload: serde_json::Value,
}

impl WorkerOutput {
    /// A worker call that only patches state and has no extra payload.
    pub fn patch_only(patch: ConversationPatch) -> Self {
        Self {
            patch,
            payload: serde_json::Value::Null,
        }
    }
}

/// Object-safe trait for the C2-C5 workers.
///
/// Any of the entity extractor, correction agent, scenario engine, or
/// retrieval worker implements this trait. Workers are stored as
/// `Arc<dyn WorkerDyn>` in [`WorkerRegistry`], keyed by the name the
/// router's action plan names them by (§3 `action_plan_struct.tool`).
#[async_trait]
pub trait WorkerDyn: Send + Sync {
    /// The worker's unique name, matched against `PlanItem::tool`.
    fn name(&self) -> &str;

    /// Human-readable description, surfaced in diagnostics only.
    fn description(&self) -> &str;

    /// Run the worker against a read-only state snapshot and the plan
    /// item's opaque input.
    async fn call(
        &self,
        state: &banking_types::ConversationState,
        input: serde_json::Value,
    ) -> Result<WorkerOutput, WorkerError>;
}

/// Registry of workers available to the turn driver.
///
/// Holds workers as `Arc<dyn WorkerDyn>` keyed by name. The driver's
/// dispatch loop looks up each `PlanItem::tool` here in plan order.
pub struct WorkerRegistry {
    workers: HashMap<String, Arc<dyn WorkerDyn>>,
}

impl WorkerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            workers: HashMap::new(),
        }
    }

    /// Register a worker. Overwrites any existing worker with the same
    /// name.
    pub fn register(&mut self, worker: Arc<dyn WorkerDyn>) {
        self.workers.insert(worker.name().to_string(), worker);
    }

    /// Look up a worker by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn WorkerDyn>> {
        self.workers.get(name)
    }

    /// Iterate over all registered workers.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn WorkerDyn>> {
        self.workers.values()
    }

    /// Number of registered workers.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl Default for WorkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_types::ConversationState;
    use serde_json::json;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn worker_dyn_is_object_safe() {
        _assert_send_sync::<Arc<dyn WorkerDyn>>();
    }

    struct EchoWorker;

    #[async_trait]
    impl WorkerDyn for EchoWorker {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes input back as the payload"
        }
        async fn call(
            &self,
            _state: &ConversationState,
            input: serde_json::Value,
        ) -> Result<WorkerOutput, WorkerError> {
            Ok(WorkerOutput {
                patch: ConversationPatch::default(),
                payload: json!({"echoed": input}),
            })
        }
    }

    struct FailWorker;

    #[async_trait]
    impl WorkerDyn for FailWorker {
        fn name(&self) -> &str {
            "fail"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        async fn call(
            &self,
            _state: &ConversationState,
            _input: serde_json::Value,
        ) -> Result<WorkerOutput, WorkerError> {
            Err(WorkerError::ExecutionFailed("always fails".into()))
        }
    }

    #[test]
    fn registry_add_and_get() {
        let mut reg = WorkerRegistry::new();
        assert!(reg.is_empty());

        reg.register(Arc::new(EchoWorker));
        assert_eq!(reg.len(), 1);
        assert!(reg.get("echo").is_some());
        assert!(reg.get("nonexistent").is_none());
    }

    #[test]
    fn registry_iter() {
        let mut reg = WorkerRegistry::new();
        reg.register(Arc::new(EchoWorker));
        reg.register(Arc::new(FailWorker));

        let names: Vec<&str> = reg.iter().map(|w| w.name()).collect();
        assert!(names.contains(&"echo"));
        assert!(names.contains(&"fail"));
    }

    #[tokio::test]
    async fn registry_call_worker() {
        let mut reg = WorkerRegistry::new();
        reg.register(Arc::new(EchoWorker));
        let state = ConversationState::new();

        let worker = reg.get("echo").unwrap();
        let result = worker.call(&state, json!({"msg": "hello"})).await.unwrap();
        assert_eq!(result.payload, json!({"echoed": {"msg": "hello"}}));
    }

    #[tokio::test]
    async fn registry_call_failing_worker() {
        let mut reg = WorkerRegistry::new();
        reg.register(Arc::new(FailWorker));
        let state = ConversationState::new();

        let worker = reg.get("fail").unwrap();
        let result = worker.call(&state, json!({})).await;
        assert!(result.is_err());
    }

    #[test]
    fn registry_overwrite() {
        let mut reg = WorkerRegistry::new();
        reg.register(Arc::new(EchoWorker));
        assert_eq!(reg.len(), 1);
        reg.register(Arc::new(EchoWorker));
        assert_eq!(reg.len(), 1);
    }
}
