//! The two sub-agents embedded in group-collect mode (§4.4): an
//! internet-banking agent that maps Korean amount expressions to
//! transfer-limit fields, and a check-card agent that maps Korean
//! descriptors to canonical choice/boolean values. Both share C2's
//! extract-validate-respond contract and emit a `guidance_message`
//! naming what is still missing.

use std::collections::HashMap;

use banking_nlu::numeral::convert_manwon;
use banking_types::CollectedValue;

/// Result of one sub-agent pass: extracted values plus a guidance
/// message naming anything still missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubAgentOutcome {
    /// Field key -> extracted value.
    pub extracted: HashMap<String, CollectedValue>,
    /// Human-readable note on what is still outstanding, empty if
    /// nothing is missing.
    pub guidance_message: String,
}

/// Internet-banking agent (§4.4): recognizes Korean amount expressions
/// up to 억 and assigns them to `transfer_limit_per_time` or
/// `transfer_limit_per_day` by contextual keyword ("1회"/"일회" vs
/// "1일"/"하루"/"일일").
pub fn internet_banking_agent(utterance: &str) -> SubAgentOutcome {
    const PER_TIME_MARKERS: &[&str] = &["1회", "일회", "한번", "한 번", "건당"];
    const PER_DAY_MARKERS: &[&str] = &["1일", "하루", "일일", "매일"];

    let mut extracted = HashMap::new();
    for clause in utterance.split(|c| c == ',' || c == '.') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        let Some(amount) = convert_manwon(clause) else {
            continue;
        };
        if PER_TIME_MARKERS.iter().any(|m| clause.contains(m)) {
            extracted.insert("transfer_limit_per_time".to_string(), CollectedValue::Number(amount));
        } else if PER_DAY_MARKERS.iter().any(|m| clause.contains(m)) {
            extracted.insert("transfer_limit_per_day".to_string(), CollectedValue::Number(amount));
        }
    }

    let mut missing = Vec::new();
    if !extracted.contains_key("transfer_limit_per_time") {
        missing.push("1회 이체한도");
    }
    if !extracted.contains_key("transfer_limit_per_day") {
        missing.push("1일 이체한도");
    }

    SubAgentOutcome {
        extracted,
        guidance_message: if missing.is_empty() {
            String::new()
        } else {
            format!("{}를(을) 말씀해 주세요.", missing.join(", "))
        },
    }
}

/// Check-card agent (§4.4): maps Korean descriptors to the card
/// configuration fields (receive method, card type, postpaid-transport
/// boolean, payment day, statement-delivery method,
/// password-same-as-account boolean, card-usage-alert boolean).
pub fn check_card_agent(utterance: &str) -> SubAgentOutcome {
    let mut extracted = HashMap::new();

    match_choice(utterance, "receive_method", &[("방문", "visit"), ("택배", "courier"), ("등기", "registered_mail")], &mut extracted);
    match_choice(utterance, "card_type", &[("체크", "check"), ("후불교통", "postpaid_transport"), ("일반", "standard")], &mut extracted);
    match_choice(
        utterance,
        "statement_delivery_method",
        &[("이메일", "email"), ("우편", "mail"), ("문자", "sms"), ("앱", "app")],
        &mut extracted,
    );

    if utterance.contains("후불교통") || (utterance.contains("후불") && utterance.contains("교통")) {
        extracted.insert("postpaid_transport".to_string(), CollectedValue::Boolean(true));
    } else if let Some(b) = CollectedValue::coerce_bool_str(utterance) {
        if utterance.contains("교통") {
            extracted.insert("postpaid_transport".to_string(), CollectedValue::Boolean(b));
        }
    }

    if utterance.contains("계좌") && utterance.contains("비밀번호") {
        if let Some(b) = CollectedValue::coerce_bool_str(utterance) {
            extracted.insert("password_same_as_account".to_string(), CollectedValue::Boolean(b));
        }
    }

    if utterance.contains("알림") || utterance.contains("문자 통보") {
        if let Some(b) = CollectedValue::coerce_bool_str(utterance) {
            extracted.insert("card_usage_alert".to_string(), CollectedValue::Boolean(b));
        }
    }

    if let Some(day) = extract_payment_day(utterance) {
        extracted.insert("payment_day".to_string(), CollectedValue::Number(day));
    }

    const FIELD_LABELS: &[(&str, &str)] = &[
        ("receive_method", "수령 방법"),
        ("card_type", "카드 종류"),
        ("postpaid_transport", "후불교통 기능 사용 여부"),
        ("payment_day", "결제일"),
        ("statement_delivery_method", "명세서 수령 방법"),
        ("password_same_as_account", "비밀번호를 계좌 비밀번호와 동일하게 설정할지"),
        ("card_usage_alert", "카드 사용 알림 신청 여부"),
    ];
    let missing: Vec<&str> = FIELD_LABELS
        .iter()
        .filter(|(key, _)| !extracted.contains_key(*key))
        .map(|(_, label)| *label)
        .collect();

    SubAgentOutcome {
        extracted,
        guidance_message: if missing.is_empty() {
            String::new()
        } else {
            format!("{}를(을) 말씀해 주세요.", missing.join(", "))
        },
    }
}

/// Pull a payment-day value (1-30) out of `utterance`: an Arabic digit
/// run immediately followed by "일" ("15일"), or a Korean numeral
/// phrase denoting the same ("십오일").
fn extract_payment_day(utterance: &str) -> Option<i64> {
    let chars: Vec<char> = utterance.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if c.is_ascii_digit() {
            let start = i;
            let mut end = i;
            while end + 1 < chars.len() && chars[end + 1].is_ascii_digit() {
                end += 1;
            }
            if chars.get(end + 1) == Some(&'일') {
                let digits: String = chars[start..=end].iter().collect();
                if let Ok(day) = digits.parse::<i64>() {
                    if (1..=30).contains(&day) {
                        return Some(day);
                    }
                }
            }
        }
    }

    if let Some(idx) = utterance.find('일') {
        let before: String = utterance[..idx].chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
        if let Some(day) = banking_nlu::numeral::convert(&before).filter(|d| (1..=30).contains(d)) {
            return Some(day);
        }
    }
    None
}

fn match_choice(
    utterance: &str,
    key: &str,
    keyword_to_value: &[(&str, &str)],
    out: &mut HashMap<String, CollectedValue>,
) {
    if let Some((_, value)) = keyword_to_value.iter().find(|(kw, _)| utterance.contains(kw)) {
        out.insert(key.to_string(), CollectedValue::Choice(value.to_string()));
    }
}
