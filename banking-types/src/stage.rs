//! `Stage` — one node in a scenario graph.

use serde::{Deserialize, Serialize};

/// How the assistant's reply for this stage should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Plain prose.
    Narrative,
    /// A list of choices rendered as bullets.
    Bullet,
    /// A yes/no question.
    Boolean,
}

/// One candidate next stage, with the natural-language condition under
/// which the engine should pick it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    /// Natural-language description of when this transition applies,
    /// shown to the stage-transition LLM.
    pub condition_description: String,
    /// The stage to move to if this transition is chosen.
    pub next_stage_id: String,
    /// Example user phrases that would trigger this transition, used as
    /// few-shot context in the stage-transition prompt.
    #[serde(default)]
    pub example_phrases: Vec<String>,
}

/// The sum-type view of a stage's behavior (design note §9: "duck-typed
/// scenario transitions ⇒ interface"). Every stage carries the common
/// fields in [`Stage`]; this enum captures the behavior that varies by
/// stage shape so the scenario engine's chain-through rule is a total
/// `match` instead of ad hoc field-presence checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageKind {
    /// Pure narration, no slot to fill (e.g. a disclosure screen).
    Info,
    /// Collects exactly `expected_info_key`.
    SlotFilling {
        /// The single slot this stage primarily collects.
        expected_info_key: String,
    },
    /// A yes/no question, usually gating a boolean field.
    YesNoQuestion {
        /// The boolean field this stage sets.
        expected_info_key: String,
    },
    /// Asks the user to confirm a value or summary before proceeding.
    Confirmation,
    /// No prompt of its own; resolved automatically and chained through.
    Logic,
    /// Collects many fields jointly, partitioned into field groups.
    GroupCollect {
        /// Field-group ids considered by this stage, in collection order.
        group_ids: Vec<String>,
        /// Stage to advance to once every required field in every group
        /// is filled.
        completion_next_stage_id: String,
    },
    /// A terminal node; `transitions` must be empty.
    Terminal,
}

impl StageKind {
    /// Whether this stage has no prompt of its own and should be resolved
    /// automatically by the scenario engine (§4.4 chain-through rule).
    pub fn is_logic_only(&self) -> bool {
        matches!(self, StageKind::Logic)
    }

    /// Whether this stage is a dead end for the current turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageKind::Terminal)
    }

    /// The single slot this stage variant expects, if any.
    pub fn expected_info_key(&self) -> Option<&str> {
        match self {
            StageKind::SlotFilling { expected_info_key }
            | StageKind::YesNoQuestion { expected_info_key } => Some(expected_info_key),
            _ => None,
        }
    }
}

/// A node in the scenario graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    /// Unique id within the scenario.
    pub id: String,
    /// Behavior variant for this stage.
    #[serde(flatten)]
    pub kind: StageKind,
    /// Korean prompt text, with `%{slot}%` and `{placeholder}` interpolation.
    #[serde(default)]
    pub prompt: Option<String>,
    /// How to render the prompt.
    #[serde(default = "default_response_type")]
    pub response_type: ResponseType,
    /// Choices to render, present when `response_type` is `Bullet` or `Boolean`.
    #[serde(default)]
    pub choices: Vec<crate::field::Choice>,
    /// Field-group ids to expose in the UI while this stage is active.
    #[serde(default)]
    pub visible_groups: Vec<String>,
    /// Ordered candidate transitions, tried in order by the LLM-arbitrated
    /// decision (§4.4); empty for a terminal stage.
    #[serde(default)]
    pub transitions: Vec<Transition>,
    /// Deterministic fallback when there is exactly one transition, or
    /// when the stage-transition LLM's answer isn't in the candidate set.
    #[serde(default)]
    pub default_next_stage_id: Option<String>,
    /// Subset of slots this stage allows the user to amend via the
    /// info-modification agent.
    #[serde(default)]
    pub modifiable_fields: Vec<String>,
    /// Emitted once every required slot for this stage is filled.
    #[serde(default)]
    pub completion_message: Option<String>,
}

fn default_response_type() -> ResponseType {
    ResponseType::Narrative
}

impl Stage {
    /// Whether this stage collects multiple fields jointly (§4.4 group mode).
    pub fn collects_multiple_info(&self) -> bool {
        matches!(self.kind, StageKind::GroupCollect { .. })
    }
}
