#![deny(missing_docs)]
//! Slot-visibility projector (C8, §4.8): computes the ordered sequence
//! of fields, their progress, and UI-facing groupings to push after
//! every turn.

pub mod allowlist;
pub mod progress;
pub mod remap;

use std::collections::HashMap;

use banking_types::{ConversationState, FieldSpec, Scenario, Stage};

pub use progress::FieldProjection;

/// Full projection result handed to the UI after a turn.
#[derive(Debug, Clone)]
pub struct Projection {
    /// Ordered, currently-visible fields and their collected state.
    pub fields: Vec<FieldProjection>,
    /// Completion rate over the required, visible fields (§4.8).
    pub completion_rate: f32,
    /// Every field group the scenario declares, as `(id, name)`.
    pub field_groups: Vec<(String, String)>,
    /// Group ids with at least one currently-visible field.
    pub visible_groups: Vec<String>,
    /// The group ids `stage.visible_groups` names directly.
    pub current_stage_groups: Vec<String>,
    /// Choice field key -> `(value, display)` pairs, for UI rendering.
    pub choice_display: HashMap<String, Vec<(String, String)>>,
    /// Field-group id -> number of fields in that group, restricted to
    /// whatever `services_selected` currently unlocks.
    pub service_field_counts: HashMap<String, usize>,
}

/// Compute the UI projection for `stage` given `state`, within
/// `scenario`.
pub fn project(scenario: &Scenario, stage: &Stage, state: &ConversationState) -> Projection {
    let collected_info = remap::normalize(scenario, &state.collected_info);

    let allowed = allowlist::allowed_keys(scenario, stage, &collected_info);
    let mut visible_fields: Vec<&FieldSpec> = scenario
        .required_info_fields
        .iter()
        .filter(|f| allowed.contains(f.key.as_str()))
        .filter(|f| {
            f.show_when
                .as_deref()
                .map(|expr| banking_types::show_when::apply(expr, &collected_info))
                .unwrap_or(true)
        })
        .collect();
    visible_fields.sort_by_key(|f| scenario.required_info_fields.iter().position(|g| g.key == f.key));

    let (fields, completion_rate) = progress::project_fields(&visible_fields, &collected_info);

    let field_groups: Vec<(String, String)> = scenario.field_groups.iter().map(|g| (g.id.clone(), g.name.clone())).collect();

    let visible_keys: std::collections::HashSet<&str> = visible_fields.iter().map(|f| f.key.as_str()).collect();
    let visible_groups: Vec<String> = scenario
        .field_groups
        .iter()
        .filter(|g| g.field_keys.iter().any(|k| visible_keys.contains(k.as_str())))
        .map(|g| g.id.clone())
        .collect();

    let choice_display: HashMap<String, Vec<(String, String)>> = scenario
        .required_info_fields
        .iter()
        .filter(|f| matches!(f.field_type, banking_types::FieldType::Choice))
        .map(|f| {
            let pairs = f.choices.iter().map(|c| (c.value().to_string(), c.display().to_string())).collect();
            (f.key.clone(), pairs)
        })
        .collect();

    let service_field_counts: HashMap<String, usize> = scenario
        .field_groups
        .iter()
        .map(|g| (g.id.clone(), g.field_keys.iter().filter(|k| visible_keys.contains(k.as_str())).count()))
        .collect();

    Projection {
        fields,
        completion_rate,
        field_groups,
        visible_groups,
        current_stage_groups: stage.visible_groups.clone(),
        choice_display,
        service_field_counts,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use banking_types::{CollectedValue, FieldGroup, FieldType, ProductType, ResponseType, StageKind};
    use proptest::prelude::*;
    use std::collections::HashMap as Map;

    /// L1: projection is a pure, deterministic function of its inputs —
    /// running it twice over identical state yields identical output.
    proptest! {
        #[test]
        fn projection_is_pure(name_present in any::<bool>(), name in "[가-힣]{1,4}") {
            let scenario = Scenario {
                product_id: ProductType::Didimdol,
                initial_stage_id: "s".into(),
                stages: Map::new(),
                required_info_fields: vec![FieldSpec {
                    key: "name".into(),
                    display_name: "성명".into(),
                    field_type: FieldType::Text,
                    required: true,
                    choices: vec![],
                    unit: None,
                    description: None,
                    show_when: None,
                    parent_field: None,
                    default: None,
                    group: "basic_info".into(),
                }],
                field_groups: vec![FieldGroup {
                    id: "basic_info".into(),
                    name: "기본 정보".into(),
                    field_keys: vec!["name".into()],
                }],
                end_message: String::new(),
                display_labels: Map::new(),
            };
            let stage = Stage {
                id: "s".into(),
                kind: StageKind::Info,
                prompt: None,
                response_type: ResponseType::Narrative,
                choices: vec![],
                visible_groups: vec!["basic_info".into()],
                transitions: vec![],
                default_next_stage_id: None,
                modifiable_fields: vec![],
                completion_message: None,
            };
            let mut state = ConversationState::new();
            if name_present {
                state.collected_info.insert("name".to_string(), CollectedValue::Text(name));
            }

            let first = project(&scenario, &stage, &state);
            let second = project(&scenario, &stage, &state);
            prop_assert_eq!(first.completion_rate, second.completion_rate);
            prop_assert_eq!(first.fields.len(), second.fields.len());
        }
    }
}
