//! Field validation rules (§4.4): the bounded ranges and format
//! heuristics a collected value must satisfy before a stage counts it
//! as complete.

use banking_nlu::patterns::{validate_transfer_limit_per_day, validate_transfer_limit_per_time};
use banking_nlu::Patterns;
use banking_types::{CollectedValue, FieldSpec, FieldType, ValidationError};

/// Minimum administrative-unit markers an address must contain to pass
/// the minimum-length heuristic (§4.4).
const ADDRESS_MARKERS: &[&str] = &["시", "도", "구", "군", "동", "읍", "면", "로", "길"];

/// Validate one collected value against its field's declared type and
/// the domain-specific bounds named in §4.4.
pub fn validate_field(field: &FieldSpec, value: &CollectedValue) -> Result<(), ValidationError> {
    match (field.field_type, value) {
        (FieldType::Number, CollectedValue::Number(n)) => validate_number_field(field, *n),
        (FieldType::Text, CollectedValue::Text(s)) => validate_text_field(field, s),
        (FieldType::Boolean, CollectedValue::Boolean(_)) => Ok(()),
        (FieldType::Choice, CollectedValue::Choice(v)) => validate_choice_field(field, v),
        _ => Err(ValidationError::Malformed {
            field: field.key.clone(),
            message: "값의 형식이 올바르지 않습니다.".to_string(),
        }),
    }
}

fn validate_number_field(field: &FieldSpec, n: i64) -> Result<(), ValidationError> {
    let result = if field.key.contains("payment_day") {
        banking_nlu::patterns::validate_payment_day(n)
    } else if field.key.contains("per_time") {
        validate_transfer_limit_per_time(n)
    } else if field.key.contains("per_day") {
        validate_transfer_limit_per_day(n)
    } else if n < 0 {
        Err("0 이상의 값을 입력해 주세요.".to_string())
    } else {
        Ok(())
    };
    result.map_err(|message| ValidationError::OutOfRange {
        field: field.key.clone(),
        message,
    })
}

fn validate_text_field(field: &FieldSpec, s: &str) -> Result<(), ValidationError> {
    let malformed = |message: &str| ValidationError::Malformed {
        field: field.key.clone(),
        message: message.to_string(),
    };

    if field.key.contains("phone") || field.key.contains("mobile") {
        if Patterns::new().match_mobile(s).as_deref() == Some(s) {
            Ok(())
        } else {
            Err(malformed("휴대폰 번호 형식이 올바르지 않습니다. 010-0000-0000 형식으로 입력해 주세요."))
        }
    } else if field.key == "name" {
        if Patterns::new().match_name(s) {
            Ok(())
        } else {
            Err(malformed("성함은 한글 2~4자로 입력해 주세요."))
        }
    } else if field.key.contains("address") {
        if ADDRESS_MARKERS.iter().any(|m| s.contains(m)) && s.chars().count() >= 4 {
            Ok(())
        } else {
            Err(malformed("주소를 시/도/구/동 단위까지 포함하여 입력해 주세요."))
        }
    } else if s.trim().is_empty() {
        Err(ValidationError::Missing {
            field: field.key.clone(),
        })
    } else {
        Ok(())
    }
}

fn validate_choice_field(field: &FieldSpec, value: &str) -> Result<(), ValidationError> {
    if field.choices.iter().any(|c| c.value() == value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: field.key.clone(),
            message: "선택 가능한 값이 아닙니다.".to_string(),
        })
    }
}
