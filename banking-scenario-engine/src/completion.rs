//! Stage completion check (§4.4): every required, currently-visible
//! field for a stage must hold a present, type-valid value before the
//! stage is considered done.

use std::collections::HashMap;

use banking_types::{CollectedValue, FieldSpec, Scenario, Stage, StageKind};

use crate::validation::validate_field;

/// The fields a stage cares about for its completion check: the single
/// slot of a `SlotFilling`/`YesNoQuestion` stage, or the union of every
/// group a `GroupCollect` stage lists. Other stage kinds have none.
pub fn relevant_fields<'a>(stage: &Stage, scenario: &'a Scenario) -> Vec<&'a FieldSpec> {
    match &stage.kind {
        StageKind::SlotFilling { expected_info_key } | StageKind::YesNoQuestion { expected_info_key } => {
            scenario.field(expected_info_key).into_iter().collect()
        }
        StageKind::GroupCollect { group_ids, .. } => {
            let keys: Vec<&str> = scenario
                .field_groups
                .iter()
                .filter(|g| group_ids.contains(&g.id))
                .flat_map(|g| g.field_keys.iter().map(String::as_str))
                .collect();
            scenario
                .required_info_fields
                .iter()
                .filter(|f| keys.contains(&f.key.as_str()))
                .collect()
        }
        StageKind::Info | StageKind::Confirmation | StageKind::Logic | StageKind::Terminal => Vec::new(),
    }
}

/// Whether `field` is currently visible given `collected` (§4.8
/// `show_when`, fail-open on a malformed expression).
pub fn is_visible(field: &FieldSpec, collected: &HashMap<String, CollectedValue>) -> bool {
    match &field.show_when {
        Some(src) => banking_types::show_when::apply(src, collected),
        None => true,
    }
}

/// The subset of a stage's relevant, currently-visible, required fields
/// that are missing or fail validation.
pub fn missing_or_invalid_fields<'a>(
    stage: &Stage,
    scenario: &'a Scenario,
    collected: &HashMap<String, CollectedValue>,
) -> Vec<&'a FieldSpec> {
    relevant_fields(stage, scenario)
        .into_iter()
        .filter(|f| f.required && is_visible(f, collected))
        .filter(|f| match collected.get(&f.key) {
            None => true,
            Some(v) => validate_field(f, v).is_err(),
        })
        .collect()
}

/// Stage completion check: true iff every required, visible field for
/// this stage is present and passes validation.
pub fn is_stage_complete(stage: &Stage, scenario: &Scenario, collected: &HashMap<String, CollectedValue>) -> bool {
    missing_or_invalid_fields(stage, scenario, collected).is_empty()
}
