//! `CollectedValue` — a typed value in `collected_info`.
//!
//! Design note §9 ("dynamic dictionaries ⇒ tagged records"): the source
//! system models `collected_info` as a heterogeneous untyped mapping.
//! Here it is a `HashMap<String, CollectedValue>` where every value
//! carries its own type tag, so callers match instead of guessing.
//! Korean-string boolean coercion happens once, at the extractor
//! boundary, producing a native `Boolean` — never scattered through
//! downstream readers.

use serde::{Deserialize, Serialize};

/// A single collected slot value. Numbers are stored in 만원 units per
/// the scenario's field spec, exactly as extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectedValue {
    /// A `text` field.
    Text(String),
    /// A `number` field (만원 units, or a plain count such as a payment day).
    Number(i64),
    /// A `boolean` field.
    Boolean(bool),
    /// A `choice` field — always the choice's stored `value`, never its
    /// display string.
    Choice(String),
}

impl CollectedValue {
    /// Korean positive vocabulary accepted as `true` by §4.2.
    const TRUE_WORDS: &'static [&'static str] =
        &["네", "예", "응", "맞아", "맞습니다", "등록", "신청", "할게", "좋아"];
    /// Korean negative vocabulary accepted as `false` by §4.2.
    const FALSE_WORDS: &'static [&'static str] =
        &["아니", "싫", "필요없", "안할", "안해", "괜찮"];

    /// Coerce a raw string into a boolean using the native + Korean
    /// vocabularies from §4.2. Returns `None` if neither vocabulary matches.
    pub fn coerce_bool_str(raw: &str) -> Option<bool> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            return Some(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Some(false);
        }
        if Self::TRUE_WORDS.iter().any(|w| trimmed.contains(w)) {
            return Some(true);
        }
        if Self::FALSE_WORDS.iter().any(|w| trimmed.contains(w)) {
            return Some(false);
        }
        None
    }

    /// Read this value as a boolean, coercing native booleans and the
    /// Korean vocabulary. Non-boolean variants coerce by presence
    /// (any non-empty text/number/choice is truthy) matching the
    /// "show_when null test" semantics used by the projector.
    pub fn as_bool(&self) -> bool {
        match self {
            CollectedValue::Boolean(b) => *b,
            CollectedValue::Text(s) | CollectedValue::Choice(s) => {
                Self::coerce_bool_str(s).unwrap_or(!s.is_empty())
            }
            CollectedValue::Number(n) => *n != 0,
        }
    }

    /// Render as the string the formatter interpolates into `%{slot}%`.
    pub fn display_string(&self) -> String {
        match self {
            CollectedValue::Text(s) | CollectedValue::Choice(s) => s.clone(),
            CollectedValue::Number(n) => n.to_string(),
            CollectedValue::Boolean(b) => {
                if *b {
                    "예".to_string()
                } else {
                    "아니오".to_string()
                }
            }
        }
    }
}
