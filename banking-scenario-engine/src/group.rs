//! Group-collect mode (§4.4): a stage that collects several fields
//! jointly, partitioned into field groups, prompting for the next
//! incomplete group until every group's required fields are filled.

use std::collections::HashMap;

use banking_types::{CollectedValue, FieldSpec, Scenario, Stage, StageKind};

use crate::completion::{is_visible, missing_or_invalid_fields};

/// Outcome of one group-collect step.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupModeResult {
    /// At least one required field is still missing; reprompt naming
    /// the first incomplete group and its missing fields.
    Prompt {
        /// The group being prompted for.
        group_id: String,
        /// Missing/invalid field keys within that group.
        missing_fields: Vec<String>,
    },
    /// Every required field across every listed group is present and
    /// valid; advance to `next_stage_id`.
    Complete {
        /// The stage declared via `completion_next_stage_id`.
        next_stage_id: String,
    },
}

/// Run one group-collect step for `stage`, assuming `stage.kind` is
/// `GroupCollect`. Groups are considered in declaration order; the
/// first with a missing or invalid required field wins.
pub fn step(stage: &Stage, scenario: &Scenario, collected: &HashMap<String, CollectedValue>) -> GroupModeResult {
    let StageKind::GroupCollect {
        group_ids,
        completion_next_stage_id,
    } = &stage.kind
    else {
        panic!("group::step called on a non-GroupCollect stage");
    };

    for group_id in group_ids {
        let Some(group) = scenario.field_groups.iter().find(|g| &g.id == group_id) else {
            continue;
        };
        let missing: Vec<String> = group
            .field_keys
            .iter()
            .filter_map(|key| scenario.field(key))
            .filter(|f| f.required && is_visible(f, collected))
            .filter(|f| {
                missing_or_invalid_fields(stage, scenario, collected)
                    .iter()
                    .any(|m| m.key == f.key)
            })
            .map(|f: &FieldSpec| f.key.clone())
            .collect();
        if !missing.is_empty() {
            return GroupModeResult::Prompt {
                group_id: group_id.clone(),
                missing_fields: missing,
            };
        }
    }

    GroupModeResult::Complete {
        next_stage_id: completion_next_stage_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_types::{FieldGroup, FieldType, ProductType, ResponseType};
    use std::collections::HashMap as Map;

    fn field(key: &str) -> FieldSpec {
        FieldSpec {
            key: key.into(),
            display_name: key.into(),
            field_type: FieldType::Text,
            required: true,
            choices: Vec::new(),
            unit: None,
            description: None,
            show_when: None,
            parent_field: None,
            default: None,
            group: "g".into(),
        }
    }

    fn scenario() -> Scenario {
        Scenario {
            product_id: ProductType::DepositAccount,
            initial_stage_id: "s0".into(),
            stages: Map::new(),
            required_info_fields: vec![field("name"), field("phone"), field("address")],
            field_groups: vec![
                FieldGroup {
                    id: "personal".into(),
                    name: "Personal".into(),
                    field_keys: vec!["name".into(), "phone".into()],
                },
                FieldGroup {
                    id: "location".into(),
                    name: "Location".into(),
                    field_keys: vec!["address".into()],
                },
            ],
            end_message: "done".into(),
            display_labels: Map::new(),
        }
    }

    fn stage() -> Stage {
        Stage {
            id: "collect".into(),
            kind: StageKind::GroupCollect {
                group_ids: vec!["personal".into(), "location".into()],
                completion_next_stage_id: "next".into(),
            },
            prompt: Some("알려주세요".into()),
            response_type: ResponseType::Narrative,
            choices: Vec::new(),
            visible_groups: vec!["personal".into(), "location".into()],
            transitions: Vec::new(),
            default_next_stage_id: None,
            modifiable_fields: Vec::new(),
            completion_message: None,
        }
    }

    #[test]
    fn prompts_for_first_incomplete_group_in_order() {
        let scenario = scenario();
        let stage = stage();
        let collected = Map::new();
        let result = step(&stage, &scenario, &collected);
        assert_eq!(
            result,
            GroupModeResult::Prompt {
                group_id: "personal".into(),
                missing_fields: vec!["name".into(), "phone".into()],
            }
        );
    }

    #[test]
    fn moves_to_next_group_once_first_is_filled() {
        let scenario = scenario();
        let stage = stage();
        let mut collected = Map::new();
        collected.insert("name".into(), CollectedValue::Text("김민준".into()));
        collected.insert("phone".into(), CollectedValue::Text("010-1234-5678".into()));
        let result = step(&stage, &scenario, &collected);
        assert_eq!(
            result,
            GroupModeResult::Prompt {
                group_id: "location".into(),
                missing_fields: vec!["address".into()],
            }
        );
    }

    #[test]
    fn completes_once_every_group_is_filled() {
        let scenario = scenario();
        let stage = stage();
        let mut collected = Map::new();
        collected.insert("name".into(), CollectedValue::Text("김민준".into()));
        collected.insert("phone".into(), CollectedValue::Text("010-1234-5678".into()));
        collected.insert("address".into(), CollectedValue::Text("서울시 강남구".into()));
        let result = step(&stage, &scenario, &collected);
        assert_eq!(
            result,
            GroupModeResult::Complete {
                next_stage_id: "next".into(),
            }
        );
    }
}
