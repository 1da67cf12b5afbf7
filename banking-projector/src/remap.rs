//! Boolean coercion + field-name remapping (§4.8), applied to a copy of
//! `collected_info` before projection so every downstream consumer sees
//! canonical English keys and native booleans.

use std::collections::HashMap;

use banking_types::{CollectedValue, FieldType, Scenario};

/// Korean-labeled keys occasionally written straight into `collected_info`
/// by an older extraction path, renamed to the scenario's canonical key.
const KOREAN_KEY_REMAP: &[(&str, &str)] = &[
    ("집주소", "address"),
    ("직장주소", "work_address"),
    ("전화번호", "phone"),
    ("이메일", "email"),
    ("성명", "name"),
    ("영문성명", "english_name"),
    ("주민등록번호", "resident_number"),
];

fn canonical_key(key: &str) -> &str {
    KOREAN_KEY_REMAP
        .iter()
        .find(|(korean, _)| *korean == key)
        .map(|(_, english)| *english)
        .unwrap_or(key)
}

/// Rename Korean-labeled keys and coerce declared-boolean fields stored
/// as Korean boolean-ish text into native `CollectedValue::Boolean`.
pub fn normalize(scenario: &Scenario, collected_info: &HashMap<String, CollectedValue>) -> HashMap<String, CollectedValue> {
    let mut normalized = HashMap::with_capacity(collected_info.len());
    for (key, value) in collected_info {
        let key = canonical_key(key).to_string();
        let value = match (scenario.field(&key).map(|f| f.field_type), value) {
            (Some(FieldType::Boolean), CollectedValue::Text(s) | CollectedValue::Choice(s)) => {
                CollectedValue::coerce_bool_str(s).map(CollectedValue::Boolean).unwrap_or_else(|| value.clone())
            }
            _ => value.clone(),
        };
        normalized.insert(key, value);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_types::{FieldSpec, ProductType, Stage};
    use std::collections::HashMap as Map;

    fn scenario_with_boolean_field(key: &str) -> Scenario {
        Scenario {
            product_id: ProductType::Didimdol,
            initial_stage_id: "s".into(),
            stages: Map::<String, Stage>::new(),
            required_info_fields: vec![FieldSpec {
                key: key.into(),
                display_name: key.into(),
                field_type: FieldType::Boolean,
                required: false,
                choices: vec![],
                unit: None,
                description: None,
                show_when: None,
                parent_field: None,
                default: None,
                group: "g".into(),
            }],
            field_groups: vec![],
            end_message: String::new(),
            display_labels: Map::new(),
        }
    }

    #[test]
    fn korean_key_is_renamed_to_canonical_english() {
        let scenario = scenario_with_boolean_field("use_internet_banking");
        let mut info = HashMap::new();
        info.insert("집주소".to_string(), CollectedValue::Text("서울시 종로구".into()));
        let normalized = normalize(&scenario, &info);
        assert!(normalized.contains_key("address"));
    }

    #[test]
    fn korean_affirmative_text_is_coerced_to_boolean_for_boolean_field() {
        let scenario = scenario_with_boolean_field("use_internet_banking");
        let mut info = HashMap::new();
        info.insert("use_internet_banking".to_string(), CollectedValue::Text("네".into()));
        let normalized = normalize(&scenario, &info);
        assert_eq!(normalized["use_internet_banking"], CollectedValue::Boolean(true));
    }
}
