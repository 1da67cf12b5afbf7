//! Derived progress (§4.8): one projection entry per visible field, plus
//! a completion rate over the required, currently-visible fields.

use std::collections::HashMap;

use banking_types::{CollectedValue, FieldSpec};

const COMPLETION_EXEMPT_FIELD: &str = "confirm_personal_info";

fn is_toggle_boolean(field: &FieldSpec) -> bool {
    matches!(field.field_type, banking_types::FieldType::Boolean) && field.key.starts_with("use_")
}

/// One field's projection entry, as handed to the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldProjection {
    /// The field's key.
    pub key: String,
    /// Human-readable label.
    pub display_name: String,
    /// Declared value type.
    pub field_type: banking_types::FieldType,
    /// Whether the stage considers this field mandatory.
    pub required: bool,
    /// The collected value, if any.
    pub value: Option<CollectedValue>,
    /// Whether `value` is `Some`.
    pub is_collected: bool,
}

/// Build one [`FieldProjection`] per field in `visible_fields`, in their
/// given order, and the completion rate over the required ones
/// (excluding "use X" toggle booleans and `confirm_personal_info`).
pub fn project_fields(visible_fields: &[&FieldSpec], collected_info: &HashMap<String, CollectedValue>) -> (Vec<FieldProjection>, f32) {
    let projections: Vec<FieldProjection> = visible_fields
        .iter()
        .map(|f| {
            let value = collected_info.get(&f.key).cloned();
            FieldProjection {
                key: f.key.clone(),
                display_name: f.display_name.clone(),
                field_type: f.field_type,
                required: f.required,
                is_collected: value.is_some(),
                value,
            }
        })
        .collect();

    let counted: Vec<&FieldProjection> = projections
        .iter()
        .filter(|p| {
            p.required
                && p.key != COMPLETION_EXEMPT_FIELD
                && !visible_fields
                    .iter()
                    .find(|f| f.key == p.key)
                    .is_some_and(|f| is_toggle_boolean(f))
        })
        .collect();

    // I7: completionRate is 0 when the denominator is 0 (no required,
    // counted field in scope), not 100%.
    let completion_rate = if counted.is_empty() {
        0.0
    } else {
        counted.iter().filter(|p| p.is_collected).count() as f32 / counted.len() as f32
    };

    (projections, completion_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_types::FieldType;

    fn field(key: &str, required: bool, field_type: FieldType) -> FieldSpec {
        FieldSpec {
            key: key.into(),
            display_name: key.into(),
            field_type,
            required,
            choices: vec![],
            unit: None,
            description: None,
            show_when: None,
            parent_field: None,
            default: None,
            group: "g".into(),
        }
    }

    #[test]
    fn completion_rate_ignores_toggle_booleans_and_confirm_field() {
        let name = field("name", true, FieldType::Text);
        let toggle = field("use_internet_banking", true, FieldType::Boolean);
        let confirm = field("confirm_personal_info", true, FieldType::Boolean);
        let fields = vec![&name, &toggle, &confirm];

        let mut info = std::collections::HashMap::new();
        info.insert("name".to_string(), CollectedValue::Text("김민준".into()));

        let (_, rate) = project_fields(&fields, &info);
        assert_eq!(rate, 1.0);
    }

    #[test]
    fn partial_completion_is_averaged_over_required_fields() {
        let name = field("name", true, FieldType::Text);
        let phone = field("phone", true, FieldType::Text);
        let fields = vec![&name, &phone];

        let mut info = std::collections::HashMap::new();
        info.insert("name".to_string(), CollectedValue::Text("김민준".into()));

        let (_, rate) = project_fields(&fields, &info);
        assert_eq!(rate, 0.5);
    }
}
