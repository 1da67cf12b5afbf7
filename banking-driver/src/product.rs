//! Per-product worker bindings the driver dispatches `invoke_scenario_agent`
//! and `invoke_qa_agent` against.
//!
//! Unlike `entity_extraction` and `personal_info_correction` — which are
//! product-agnostic and live once in the shared `WorkerRegistry` — the
//! scenario engine and the retrieval worker are each bound to one
//! product's `Scenario`/corpus at construction time, so the driver keeps
//! one instance per `ProductType` instead of registering them under a
//! shared name.

use std::sync::Arc;

use banking_types::Scenario;
use banking_worker::WorkerDyn;

/// The scenario-engine and QA workers bound to one product, plus the
/// manual excerpt the router's task-management prompt quotes from.
pub struct ProductBinding {
    pub(crate) scenario: Arc<Scenario>,
    pub(crate) scenario_engine: Arc<dyn WorkerDyn>,
    pub(crate) qa_agent: Arc<dyn WorkerDyn>,
    pub(crate) manual: String,
}

impl ProductBinding {
    /// Bind one product's scenario, its scenario-engine worker, its QA
    /// worker, and the manual excerpt text together.
    pub fn new(
        scenario: Arc<Scenario>,
        scenario_engine: Arc<dyn WorkerDyn>,
        qa_agent: Arc<dyn WorkerDyn>,
        manual: impl Into<String>,
    ) -> Self {
        Self {
            scenario,
            scenario_engine,
            qa_agent,
            manual: manual.into(),
        }
    }
}
