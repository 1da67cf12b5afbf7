//! Deterministic pattern matching for the entity extractor's fast path
//! (§4.2 "Fast path — deterministic pattern match") and the bounded
//! validation ranges for payment-day and transfer-limit fields.

use regex::Regex;

/// Inclusive day-of-month range a `payment_day` field accepts.
pub const PAYMENT_DAY_RANGE: std::ops::RangeInclusive<i64> = 1..=30;
/// Per-transaction transfer-limit ceiling, in 만원 units.
pub const TRANSFER_LIMIT_PER_TIME_MAX: i64 = 5_000;
/// Per-day transfer-limit ceiling, in 만원 units.
pub const TRANSFER_LIMIT_PER_DAY_MAX: i64 = 10_000;

/// Compiled regexes for the extractor's deterministic fast path.
///
/// Built once at worker construction and reused across every call —
/// compiling a `Regex` is not cheap enough to redo per utterance.
pub struct Patterns {
    mobile: Regex,
    mobile_digits: Regex,
    korean_name: Regex,
}

impl Patterns {
    /// Compile the fixed pattern set.
    pub fn new() -> Self {
        Self {
            mobile: Regex::new(r"^010-\d{4}-\d{4}$").expect("valid regex"),
            mobile_digits: Regex::new(r"01[016789][-.\s]?\d{3,4}[-.\s]?\d{4}")
                .expect("valid regex"),
            korean_name: Regex::new(r"^[가-힣]{2,4}$").expect("valid regex"),
        }
    }

    /// Canonicalize a phone number to `010-XXXX-XXXX` if `text` contains
    /// one, in whatever punctuation the user typed it with.
    pub fn match_mobile(&self, text: &str) -> Option<String> {
        if self.mobile.is_match(text) {
            return Some(text.to_string());
        }
        let candidate = self.mobile_digits.find(text)?.as_str();
        let digits: String = candidate.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() != 11 {
            return None;
        }
        Some(format!("{}-{}-{}", &digits[0..3], &digits[3..7], &digits[7..11]))
    }

    /// Whether `text` looks like a bare Korean personal name: a single
    /// family-name syllable followed by one to three given-name
    /// syllables, nothing else.
    pub fn match_name(&self, text: &str) -> bool {
        self.korean_name.is_match(text.trim())
    }
}

impl Default for Patterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a `payment_day` candidate against §4.2's bounded range,
/// returning a Korean message naming the violated limit on failure.
pub fn validate_payment_day(day: i64) -> Result<(), String> {
    if PAYMENT_DAY_RANGE.contains(&day) {
        Ok(())
    } else {
        Err("결제일은 1일부터 30일 사이로 입력해 주세요.".to_string())
    }
}

/// Validate a per-transaction transfer-limit candidate (만원 units).
pub fn validate_transfer_limit_per_time(amount: i64) -> Result<(), String> {
    if amount >= 0 && amount <= TRANSFER_LIMIT_PER_TIME_MAX {
        Ok(())
    } else {
        Err("최대 5천만원까지 가능합니다".to_string())
    }
}

/// Validate a per-day transfer-limit candidate (만원 units).
pub fn validate_transfer_limit_per_day(amount: i64) -> Result<(), String> {
    if amount >= 0 && amount <= TRANSFER_LIMIT_PER_DAY_MAX {
        Ok(())
    } else {
        Err("최대 1억원까지 가능합니다".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_dashed_mobile_number() {
        let p = Patterns::new();
        assert_eq!(
            p.match_mobile("010-1234-5678"),
            Some("010-1234-5678".to_string())
        );
    }

    #[test]
    fn canonicalizes_undashed_mobile_number() {
        let p = Patterns::new();
        assert_eq!(
            p.match_mobile("01012345678"),
            Some("010-1234-5678".to_string())
        );
    }

    #[test]
    fn canonicalizes_mobile_number_embedded_in_sentence() {
        let p = Patterns::new();
        assert_eq!(
            p.match_mobile("제 번호는 010 1234 5678 이에요"),
            Some("010-1234-5678".to_string())
        );
    }

    #[test]
    fn rejects_non_mobile_text() {
        let p = Patterns::new();
        assert_eq!(p.match_mobile("서울시 종로구"), None);
    }

    #[test]
    fn matches_korean_name() {
        let p = Patterns::new();
        assert!(p.match_name("김민준"));
        assert!(p.match_name("남궁민준"));
        assert!(!p.match_name("아 그게 저는"));
    }

    #[test]
    fn payment_day_bounds() {
        assert!(validate_payment_day(1).is_ok());
        assert!(validate_payment_day(30).is_ok());
        assert!(validate_payment_day(31).is_err());
        assert!(validate_payment_day(0).is_err());
    }

    #[test]
    fn transfer_limit_bounds() {
        assert!(validate_transfer_limit_per_time(5_000).is_ok());
        assert!(validate_transfer_limit_per_time(5_001).is_err());
        assert!(validate_transfer_limit_per_day(10_000).is_ok());
        assert!(validate_transfer_limit_per_day(10_001).is_err());
    }

    #[test]
    fn transfer_limit_error_messages_match_spec_wording() {
        assert_eq!(
            validate_transfer_limit_per_time(5_001).unwrap_err(),
            "최대 5천만원까지 가능합니다"
        );
        assert_eq!(
            validate_transfer_limit_per_day(10_001).unwrap_err(),
            "최대 1억원까지 가능합니다"
        );
    }
}
