//! `TurnState` — fresh each turn, derived from `ConversationState`, and
//! the action-plan types the router (C6) emits.

use serde::{Deserialize, Serialize};

/// One item in the router's action plan (§3: `action_plan_struct`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanItem {
    /// The worker/action name, e.g. `invoke_scenario_agent`,
    /// `invoke_qa_agent`, `personal_info_correction`, `end_conversation`.
    pub tool: String,
    /// Opaque input handed to the worker, interpreted by that worker only.
    #[serde(default)]
    pub tool_input: serde_json::Value,
}

impl PlanItem {
    /// Construct a plan item with no input.
    pub fn bare(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            tool_input: serde_json::Value::Null,
        }
    }
}

/// NLU summary produced for the current utterance (§3 `scenario_nlu`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioNlu {
    /// Coarse intent label, e.g. `"provide_slot_value"`, `"ask_question"`.
    pub intent: Option<String>,
    /// Extracted entity key -> raw string value, pre type-coercion.
    pub entities: std::collections::HashMap<String, String>,
    /// Whether the router judged this utterance to be scenario-relevant
    /// (vs. off-topic chit-chat).
    pub is_scenario_related: bool,
    /// Coarse sentiment label, if the router's prompt requested one.
    pub sentiment: Option<String>,
}

/// Turn-scoped state: created by the turn driver, consumed by workers in
/// plan order, discarded at the end of the turn (§3 "Lifecycle").
#[derive(Debug, Clone, Default)]
pub struct TurnState {
    /// The raw utterance for this turn.
    pub user_input: String,
    /// The router's classification, before plan construction (business-
    /// guidance variant) — `None` once a full action plan exists.
    pub router_decision: Option<String>,
    /// Action names only, for logging/diagnostics.
    pub action_plan: Vec<String>,
    /// The structured plan the driver actually dispatches.
    pub action_plan_struct: Vec<PlanItem>,
    /// Number of worker invocations dispatched so far this turn — bounded
    /// at `MAX_ROUTER_CALLS` by the driver (§4.1).
    pub router_call_count: u32,
    /// NLU summary from the entity-extraction worker.
    pub scenario_nlu: ScenarioNlu,
    /// Field key -> extracted value for this turn, pre-merge.
    pub extracted_entities: std::collections::HashMap<String, crate::CollectedValue>,
    /// The QA worker's answer, if `invoke_qa_agent` ran this turn.
    pub factual_response: Option<String>,
    /// A direct reply string the router produced itself (e.g.
    /// `answer_directly_chit_chat`'s `direct_response`), bypassing any
    /// worker dispatch this turn.
    pub router_direct_response: Option<String>,
    /// The synthesizer's merged reply, before final emission.
    pub synthesized_response: Option<String>,
    /// The reply actually sent to the user this turn.
    pub final_response_text: Option<String>,
    /// Set by a worker (e.g. the correction agent) that has already
    /// produced the final reply — short-circuits the synthesizer.
    pub is_final_turn_response: bool,
    /// Set when a worker hit a recoverable error this turn (§7); never
    /// propagated as a panic or `Err` out of the driver.
    pub error_message: Option<String>,
}

impl TurnState {
    /// Seed a fresh turn state for an incoming utterance.
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            ..Default::default()
        }
    }
}
