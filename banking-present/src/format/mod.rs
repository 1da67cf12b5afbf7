//! Stage-response formatter (C7, §4.7): renders a [`Stage`]'s prompt
//! against the current `collected_info`, with `%{slot}%`/`{placeholder}`
//! interpolation, bullet/choice rendering, and Korean currency
//! formatting. A pure function of its three immutable inputs — no I/O,
//! no stage-transition authority.

pub mod currency;

use banking_types::{CollectedValue, ConversationState, FieldType, ResponseType, Scenario, Stage};
use regex::Regex;
use serde_json::{json, Value};

const MISSING_VALUE_LITERAL: &str = "미입력";
const FINAL_CONFIRMATION_STAGE_ID: &str = "final_confirmation";

fn slot_pattern() -> Regex {
    Regex::new(r"%\{(\w+)\}%").expect("static regex is valid")
}

fn field_type_of<'a>(scenario: &'a Scenario, key: &str) -> Option<FieldType> {
    scenario.field(key).map(|f| f.field_type)
}

fn display_value(scenario: &Scenario, key: &str, value: &CollectedValue) -> String {
    match (field_type_of(scenario, key), value) {
        (Some(FieldType::Number), CollectedValue::Number(n)) => currency::format_manwon(*n),
        _ => value.display_string(),
    }
}

fn substitute_slots(template: &str, scenario: &Scenario, state: &ConversationState) -> String {
    slot_pattern()
        .replace_all(template, |caps: &regex::Captures| {
            let key = &caps[1];
            state
                .collected_info
                .get(key)
                .map(|v| display_value(scenario, key, v))
                .unwrap_or_else(|| MISSING_VALUE_LITERAL.to_string())
        })
        .into_owned()
}

fn default_choice_display(stage: &Stage) -> Option<String> {
    stage.choices.iter().find(|c| c.is_default()).map(|c| c.display().to_string())
}

/// Build the multi-line order review substituted at `{summary}` on the
/// `final_confirmation` stage: one bulleted section per field group,
/// listing every field that has actually been collected.
fn build_summary(scenario: &Scenario, state: &ConversationState) -> String {
    let mut sections = Vec::new();
    for group in &scenario.field_groups {
        let bullets: Vec<String> = group
            .field_keys
            .iter()
            .filter_map(|key| {
                let value = state.collected_info.get(key)?;
                let label = scenario
                    .display_labels
                    .get(key)
                    .cloned()
                    .or_else(|| scenario.field(key).map(|f| f.display_name.clone()))
                    .unwrap_or_else(|| key.clone());
                Some(format!("- {label}: {}", display_value(scenario, key, value)))
            })
            .collect();
        if bullets.is_empty() {
            continue;
        }
        sections.push(format!("[{}]\n{}", group.name, bullets.join("\n")));
    }
    sections.join("\n\n")
}

/// A choice in display-ready form (§4.7: "value, display, keywords,
/// default, metadata").
#[derive(Debug, Clone)]
pub struct ChoiceView {
    /// Stored value if selected.
    pub value: String,
    /// UI display string.
    pub display: String,
    /// Deterministic-match keywords.
    pub keywords: Vec<String>,
    /// Whether this is the scenario's declared default.
    pub default: bool,
    /// Free-form metadata passed through untouched.
    pub metadata: Value,
}

/// The rendered outgoing assistant payload for one stage.
#[derive(Debug, Clone)]
pub struct FormattedPrompt {
    /// The interpolated Korean prompt text.
    pub text: String,
    /// How the UI should render it.
    pub response_type: ResponseType,
    /// Present when `response_type` is `Bullet`/`Boolean`.
    pub choices: Vec<ChoiceView>,
    /// Display string of the choice flagged `default`, if any.
    pub default_choice: Option<String>,
}

impl FormattedPrompt {
    /// Serialize to the dual camelCase/snake_case JSON shape the UI
    /// expects (§4.7: "emit both... for UI compatibility").
    pub fn to_json(&self) -> Value {
        let choices: Vec<Value> = self
            .choices
            .iter()
            .map(|c| {
                json!({
                    "value": c.value,
                    "display": c.display,
                    "keywords": c.keywords,
                    "default": c.default,
                    "metadata": c.metadata,
                })
            })
            .collect();

        json!({
            "text": self.text,
            "response_type": response_type_str(self.response_type),
            "responseType": response_type_str(self.response_type),
            "choices": choices,
            "default_choice": self.default_choice,
            "defaultChoice": self.default_choice,
        })
    }
}

fn response_type_str(rt: ResponseType) -> &'static str {
    match rt {
        ResponseType::Narrative => "narrative",
        ResponseType::Bullet => "bullet",
        ResponseType::Boolean => "boolean",
    }
}

/// Render `stage`'s outgoing prompt against `state`, within `scenario`
/// (needed for field display names/types and the final-confirmation
/// summary — see `DESIGN.md` for why this widens the two-argument
/// signature named in passing elsewhere).
pub fn format_stage(stage: &Stage, scenario: &Scenario, state: &ConversationState) -> FormattedPrompt {
    let template = stage.prompt.clone().unwrap_or_default();
    let mut text = substitute_slots(&template, scenario, state);

    if let Some(display) = default_choice_display(stage) {
        text = text.replace("{default_choice}", &display);
    }
    if stage.id == FINAL_CONFIRMATION_STAGE_ID {
        text = text.replace("{summary}", &build_summary(scenario, state));
    }

    let choices = if matches!(stage.response_type, ResponseType::Bullet | ResponseType::Boolean) {
        stage
            .choices
            .iter()
            .map(|c| ChoiceView {
                value: c.value().to_string(),
                display: c.display().to_string(),
                keywords: c.keywords().to_vec(),
                default: c.is_default(),
                metadata: match c {
                    banking_types::Choice::Full { metadata, .. } => metadata.clone(),
                    banking_types::Choice::Bare(_) => Value::Null,
                },
            })
            .collect()
    } else {
        Vec::new()
    };

    FormattedPrompt {
        text,
        response_type: stage.response_type,
        default_choice: default_choice_display(stage),
        choices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_types::{Choice, FieldGroup, FieldSpec, ProductType, StageKind};
    use std::collections::HashMap;

    fn scenario_with(field_groups: Vec<FieldGroup>, fields: Vec<FieldSpec>) -> Scenario {
        Scenario {
            product_id: ProductType::Didimdol,
            initial_stage_id: "start".into(),
            stages: HashMap::new(),
            required_info_fields: fields,
            field_groups,
            end_message: "완료".into(),
            display_labels: HashMap::new(),
        }
    }

    fn number_field(key: &str) -> FieldSpec {
        FieldSpec {
            key: key.into(),
            display_name: key.into(),
            field_type: FieldType::Number,
            required: true,
            choices: vec![],
            unit: Some("만원".into()),
            description: None,
            show_when: None,
            parent_field: None,
            default: None,
            group: "g".into(),
        }
    }

    #[test]
    fn slot_substitution_falls_back_to_missing_literal() {
        let scenario = scenario_with(vec![], vec![]);
        let mut state = ConversationState::new();
        state.collected_info.insert("name".into(), CollectedValue::Text("김민준".into()));

        let stage = Stage {
            id: "s".into(),
            kind: StageKind::Info,
            prompt: Some("성함은 %{name}%, 전화번호는 %{phone}%입니다.".into()),
            response_type: ResponseType::Narrative,
            choices: vec![],
            visible_groups: vec![],
            transitions: vec![],
            default_next_stage_id: None,
            modifiable_fields: vec![],
            completion_message: None,
        };

        let formatted = format_stage(&stage, &scenario, &state);
        assert_eq!(formatted.text, "성함은 김민준, 전화번호는 미입력입니다.");
    }

    #[test]
    fn number_slot_is_rendered_with_currency_breakdown() {
        let scenario = scenario_with(vec![], vec![number_field("loan_amount")]);
        let mut state = ConversationState::new();
        state.collected_info.insert("loan_amount".into(), CollectedValue::Number(15_000));

        let stage = Stage {
            id: "s".into(),
            kind: StageKind::Info,
            prompt: Some("대출 금액은 %{loan_amount}%입니다.".into()),
            response_type: ResponseType::Narrative,
            choices: vec![],
            visible_groups: vec![],
            transitions: vec![],
            default_next_stage_id: None,
            modifiable_fields: vec![],
            completion_message: None,
        };

        let formatted = format_stage(&stage, &scenario, &state);
        assert_eq!(formatted.text, "대출 금액은 1억5000만원입니다.");
    }

    #[test]
    fn bullet_stage_exposes_default_choice() {
        let scenario = scenario_with(vec![], vec![]);
        let state = ConversationState::new();
        let stage = Stage {
            id: "s".into(),
            kind: StageKind::SlotFilling {
                expected_info_key: "account_type".into(),
            },
            prompt: Some("선택: {default_choice}".into()),
            response_type: ResponseType::Bullet,
            choices: vec![
                Choice::Full {
                    value: "regular".into(),
                    display: "보통예금".into(),
                    keywords: vec![],
                    default: true,
                    metadata: Value::Null,
                },
                Choice::Bare("기타".into()),
            ],
            visible_groups: vec![],
            transitions: vec![],
            default_next_stage_id: None,
            modifiable_fields: vec![],
            completion_message: None,
        };

        let formatted = format_stage(&stage, &scenario, &state);
        assert_eq!(formatted.text, "선택: 보통예금");
        assert_eq!(formatted.choices.len(), 2);
        assert_eq!(formatted.default_choice.as_deref(), Some("보통예금"));

        let json = formatted.to_json();
        assert_eq!(json["defaultChoice"], json["default_choice"]);
    }

    #[test]
    fn final_confirmation_summary_lists_collected_groups() {
        let group = FieldGroup {
            id: "basic".into(),
            name: "기본 정보".into(),
            field_keys: vec!["name".into()],
        };
        let scenario = scenario_with(vec![group], vec![]);
        let mut state = ConversationState::new();
        state.collected_info.insert("name".into(), CollectedValue::Text("김민준".into()));

        let stage = Stage {
            id: FINAL_CONFIRMATION_STAGE_ID.into(),
            kind: StageKind::Confirmation,
            prompt: Some("다음과 같이 신청합니다.\n{summary}".into()),
            response_type: ResponseType::Narrative,
            choices: vec![],
            visible_groups: vec![],
            transitions: vec![],
            default_next_stage_id: None,
            modifiable_fields: vec![],
            completion_message: None,
        };

        let formatted = format_stage(&stage, &scenario, &state);
        assert!(formatted.text.contains("[기본 정보]"));
        assert!(formatted.text.contains("김민준"));
    }
}
