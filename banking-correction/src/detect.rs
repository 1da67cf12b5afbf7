//! Step 1 and step 2 of the modification protocol (§4.3): detecting
//! which field the user wants to change, and what they want it changed
//! to.

use banking_nlu::{spoken_digit_string, Patterns};
use banking_types::{CollectedValue, FieldSpec, FieldType};
use regex::Regex;

/// Outcome of step 1, "detect target field".
#[derive(Debug, Clone, PartialEq)]
pub enum TargetField {
    /// A single field was identified, with the priority rung it matched
    /// at (used only for logging/diagnostics).
    Found(String),
    /// More than one field is an equally plausible target — the
    /// ambiguity rule (§4.3) requires asking the user, never guessing.
    Ambiguous(Vec<String>),
    /// Nothing in the utterance points at any field.
    None,
}

/// Step 1: priority (i) explicit field mention, (ii) standing
/// modification context, (iii) inference from the new value's shape.
/// The LLM-classification rung (iv) is the caller's responsibility,
/// since it needs a provider call.
pub fn detect_target_field(
    utterance: &str,
    current_modification_context: Option<&str>,
    fields: &[FieldSpec],
    patterns: &Patterns,
) -> TargetField {
    let explicit: Vec<&FieldSpec> = fields
        .iter()
        .filter(|f| utterance.contains(f.display_name.as_str()))
        .collect();
    match explicit.len() {
        1 => return TargetField::Found(explicit[0].key.clone()),
        n if n > 1 => {
            return TargetField::Ambiguous(explicit.iter().map(|f| f.key.clone()).collect())
        }
        _ => {}
    }

    if let Some(ctx) = current_modification_context {
        if fields.iter().any(|f| f.key == ctx) {
            return TargetField::Found(ctx.to_string());
        }
    }

    if is_phone_suffix_shape(utterance) {
        if let Some(f) = fields
            .iter()
            .find(|f| f.key.contains("phone") || f.key.contains("mobile"))
        {
            return TargetField::Found(f.key.clone());
        }
    }

    if is_address_fragment_shape(utterance, patterns) {
        let address_fields: Vec<String> = fields
            .iter()
            .filter(|f| f.key.contains("address"))
            .map(|f| f.key.clone())
            .collect();
        match address_fields.len() {
            1 => return TargetField::Found(address_fields.into_iter().next().unwrap()),
            n if n > 1 => return TargetField::Ambiguous(address_fields),
            _ => {}
        }
    }

    TargetField::None
}

/// Keywords marking "the last 4 digits" (§4.3: "phone-suffix/middle").
const PHONE_SUFFIX_KEYWORDS: &[&str] = &["뒷번호", "뒷자리", "뒤", "마지막", "끝번호"];
/// Keywords marking "the middle segment".
const PHONE_MIDDLE_KEYWORDS: &[&str] = &["가운데", "중간"];

fn has_phone_suffix_keyword(utterance: &str) -> bool {
    PHONE_SUFFIX_KEYWORDS.iter().any(|k| utterance.contains(k))
}

fn has_phone_middle_keyword(utterance: &str) -> bool {
    PHONE_MIDDLE_KEYWORDS.iter().any(|k| utterance.contains(k))
}

fn is_phone_suffix_shape(utterance: &str) -> bool {
    if has_phone_suffix_keyword(utterance) || has_phone_middle_keyword(utterance) {
        return true;
    }
    spoken_digit_string(utterance)
        .map(|d| d.len() == 4)
        .unwrap_or(false)
}

fn is_address_fragment_shape(utterance: &str, patterns: &Patterns) -> bool {
    !patterns.match_name(utterance)
        && utterance.chars().any(|c| c.is_ascii_digit())
        && utterance.chars().any(|c| ('가'..='힣').contains(&c))
}

/// Step 2: detect the new value to set the already-identified target
/// field to. Returns `None` when the utterance only names the field to
/// change without giving a replacement value — the caller transitions
/// to "ask for the value" in that case. `existing` is the field's
/// current `collected_info` value, if any — needed to merge a
/// phone-suffix/middle edit into the untouched part of the number
/// (§4.3: "partial-address + existing prefix merge" applies just as
/// much to a partial phone number).
pub fn detect_new_value(
    utterance: &str,
    field: &FieldSpec,
    patterns: &Patterns,
    existing: Option<&CollectedValue>,
) -> Option<CollectedValue> {
    if let Some(contrast) = contrast_form_target(utterance) {
        return coerce_for_field(&contrast, field, patterns, existing);
    }

    match field.field_type {
        FieldType::Text if field.key.contains("phone") || field.key.contains("mobile") => {
            if let Some(full) = patterns.match_mobile(utterance) {
                return Some(CollectedValue::Text(full));
            }

            let existing_phone = match existing {
                Some(CollectedValue::Text(s)) => Some(s.as_str()),
                _ => None,
            };

            if has_phone_middle_keyword(utterance) {
                if let Some(digits) = extract_phone_digit_group(utterance) {
                    return Some(CollectedValue::Text(merge_phone_middle(existing_phone, &digits)));
                }
            }
            if has_phone_suffix_keyword(utterance) {
                if let Some(digits) = extract_phone_digit_group(utterance) {
                    return Some(CollectedValue::Text(merge_phone_suffix(existing_phone, &digits)));
                }
            }

            if let Some(suffix) = spoken_digit_string(utterance) {
                if suffix.len() == 4 {
                    return Some(match existing_phone {
                        Some(_) => CollectedValue::Text(merge_phone_suffix(existing_phone, &suffix)),
                        None => CollectedValue::Text(suffix),
                    });
                }
            }
            None
        }
        FieldType::Text if field.key == "name" => {
            if patterns.match_name(utterance.trim()) {
                Some(CollectedValue::Text(utterance.trim().to_string()))
            } else {
                None
            }
        }
        FieldType::Text if field.key.contains("address") => {
            let trimmed = utterance.trim();
            // A bare request to edit the field ("집주소 수정하고 싶어요")
            // carries no address-shaped content; only text with a
            // number or a 동/로/길/번지 marker reads as an actual
            // address fragment.
            const ADDRESS_MARKERS: &[&str] = &["동", "로", "길", "번지", "호"];
            let looks_like_address = trimmed.chars().any(|c| c.is_ascii_digit())
                || ADDRESS_MARKERS.iter().any(|m| trimmed.contains(m));
            if trimmed.is_empty() || !looks_like_address {
                None
            } else {
                Some(CollectedValue::Text(trimmed.to_string()))
            }
        }
        FieldType::Text => email_address(utterance).map(CollectedValue::Text).or_else(|| {
            let trimmed = utterance.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(CollectedValue::Text(trimmed.to_string()))
            }
        }),
        FieldType::Boolean => CollectedValue::coerce_bool_str(utterance).map(CollectedValue::Boolean),
        FieldType::Number => utterance
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| spoken_digit_string(utterance).and_then(|d| d.parse().ok()))
            .map(CollectedValue::Number),
        FieldType::Choice => field
            .choices
            .iter()
            .find(|c| utterance.contains(c.display()) || utterance.contains(c.value()))
            .map(|c| CollectedValue::Choice(c.value().to_string())),
    }
}

fn coerce_for_field(
    raw: &str,
    field: &FieldSpec,
    patterns: &Patterns,
    existing: Option<&CollectedValue>,
) -> Option<CollectedValue> {
    detect_new_value(raw, field, patterns, existing)
}

/// Pull the first 3-4 digit run out of the utterance — the segment the
/// `뒷번호`/`가운데` keyword refers to.
fn extract_phone_digit_group(utterance: &str) -> Option<String> {
    let re = Regex::new(r"\d{3,4}").expect("valid regex");
    re.find(utterance).map(|m| m.as_str().to_string())
}

fn split_phone_parts(phone: &str) -> Option<(&str, &str, &str)> {
    let mut parts = phone.splitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(prefix), Some(middle), Some(suffix)) => Some((prefix, middle, suffix)),
        _ => None,
    }
}

/// Replace the last segment of `existing` (`010-XXXX-YYYY` -> `010-XXXX-{digits}`),
/// or fall back to a placeholder prefix/middle when there is no existing number.
fn merge_phone_suffix(existing: Option<&str>, digits: &str) -> String {
    match existing.and_then(split_phone_parts) {
        Some((prefix, middle, _)) => format!("{prefix}-{middle}-{digits}"),
        None => format!("010-xxxx-{digits}"),
    }
}

/// Replace the middle segment of `existing` (`010-XXXX-YYYY` -> `010-{digits}-YYYY`).
fn merge_phone_middle(existing: Option<&str>, digits: &str) -> String {
    match existing.and_then(split_phone_parts) {
        Some((prefix, _, suffix)) => format!("{prefix}-{digits}-{suffix}"),
        None => format!("010-{digits}-xxxx"),
    }
}

/// Extract `B` from the contrast form "A이 아니라 B" / "A가 아니고 B".
fn contrast_form_target(utterance: &str) -> Option<String> {
    let re = Regex::new(r"(?:이|가)\s*아니(?:라|고)\s*(.+)$").expect("valid regex");
    re.captures(utterance)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn email_address(text: &str) -> Option<String> {
    let re = Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid regex");
    re.find(text).map(|m| m.as_str().to_string())
}
