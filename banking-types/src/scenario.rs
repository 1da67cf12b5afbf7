//! `Scenario` — an immutable configuration loaded at startup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::field::{FieldGroup, FieldSpec};
use crate::stage::Stage;

/// Which banking task a scenario covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// "디딤돌" government-backed housing loan.
    Didimdol,
    /// Jeonse-deposit loan.
    Jeonse,
    /// A plain deposit account.
    DepositAccount,
}

impl ProductType {
    /// The scenario-JSON / action-plan name for this product
    /// (`set_product_type_didimdol`, etc.).
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Didimdol => "didimdol",
            ProductType::Jeonse => "jeonse",
            ProductType::DepositAccount => "deposit_account",
        }
    }
}

/// An immutable scenario configuration, loaded once at startup and shared
/// (behind an `Arc`) across every session that selects this product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Which product this scenario drives.
    pub product_id: ProductType,
    /// The stage a fresh session starts at.
    pub initial_stage_id: String,
    /// Every stage in the graph, keyed by id.
    pub stages: HashMap<String, Stage>,
    /// Every slot this scenario may collect, in declaration order.
    pub required_info_fields: Vec<FieldSpec>,
    /// Field groupings used by group-collect stages and the projector.
    pub field_groups: Vec<FieldGroup>,
    /// Message shown when the scenario reaches a terminal stage.
    pub end_message: String,
    /// Field key -> display label overrides for the UI.
    #[serde(default)]
    pub display_labels: HashMap<String, String>,
}

/// Errors raised while validating a loaded scenario (§6: "validated at
/// load time").
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ScenarioValidationError {
    /// `initial_stage_id` does not name a stage in `stages`.
    #[error("initial_stage_id {0:?} is not a declared stage")]
    UnknownInitialStage(String),
    /// A transition's `next_stage_id` resolves to neither a declared stage
    /// nor an `END_`-prefixed terminal marker.
    #[error("stage {stage:?} has an unresolvable next_stage_id {target:?}")]
    UnresolvableTransition { stage: String, target: String },
    /// Two `FieldSpec`s declared the same key.
    #[error("duplicate field key {0:?}")]
    DuplicateFieldKey(String),
    /// A terminal stage declared non-empty transitions.
    #[error("terminal stage {0:?} must have no transitions")]
    TerminalStageHasTransitions(String),
}

impl Scenario {
    /// Validate structural invariants from §3: exactly one initial stage,
    /// every `next_stage_id` resolvable, every field key unique, terminal
    /// stages have no transitions.
    pub fn validate(&self) -> Result<(), ScenarioValidationError> {
        if !self.stages.contains_key(&self.initial_stage_id) {
            return Err(ScenarioValidationError::UnknownInitialStage(
                self.initial_stage_id.clone(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for field in &self.required_info_fields {
            if !seen.insert(field.key.as_str()) {
                return Err(ScenarioValidationError::DuplicateFieldKey(
                    field.key.clone(),
                ));
            }
        }

        for stage in self.stages.values() {
            if stage.kind.is_terminal() && !stage.transitions.is_empty() {
                return Err(ScenarioValidationError::TerminalStageHasTransitions(
                    stage.id.clone(),
                ));
            }
            for transition in &stage.transitions {
                let target = &transition.next_stage_id;
                if !target.starts_with("END_") && !self.stages.contains_key(target) {
                    return Err(ScenarioValidationError::UnresolvableTransition {
                        stage: stage.id.clone(),
                        target: target.clone(),
                    });
                }
            }
            if let Some(default_next) = &stage.default_next_stage_id {
                if !default_next.starts_with("END_") && !self.stages.contains_key(default_next) {
                    return Err(ScenarioValidationError::UnresolvableTransition {
                        stage: stage.id.clone(),
                        target: default_next.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Look up a stage by id.
    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.get(id)
    }

    /// Look up a field spec by key.
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.required_info_fields.iter().find(|f| f.key == key)
    }
}
