//! Fuzzy matching against `FieldSpec::choices` (§4.2 "choice: require
//! an exact match against FieldSpec.choices values; otherwise run the
//! similarity matcher").

use banking_types::Choice;
use std::collections::HashSet;

/// Below this score a candidate is not considered a match at all.
const MATCH_THRESHOLD: f64 = 0.5;

fn bigrams(s: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < 2 {
        return chars.iter().map(|c| (*c, '\0')).collect();
    }
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Character-bigram Jaccard similarity, in `[0.0, 1.0]`.
fn similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (bigrams(a), bigrams(b));
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(&b).count() as f64;
    let union = a.union(&b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Find the choice whose value or display string is closest to `raw`,
/// above [`MATCH_THRESHOLD`]. Keyword matches (`Choice::keywords`) are
/// checked first and always win over fuzzy similarity, since they are
/// the scenario author's own deterministic hints.
pub fn best_choice_match<'a>(raw: &str, choices: &'a [Choice]) -> Option<&'a Choice> {
    let trimmed = raw.trim();

    if let Some(exact) = choices
        .iter()
        .find(|c| c.value() == trimmed || c.display() == trimmed)
    {
        return Some(exact);
    }

    if let Some(keyword_hit) = choices
        .iter()
        .find(|c| c.keywords().iter().any(|k| trimmed.contains(k.as_str())))
    {
        return Some(keyword_hit);
    }

    choices
        .iter()
        .map(|c| (c, similarity(trimmed, c.display()).max(similarity(trimmed, c.value()))))
        .filter(|(_, score)| *score >= MATCH_THRESHOLD)
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices() -> Vec<Choice> {
        vec![
            Choice::Full {
                value: "salary_transfer".into(),
                display: "급여이체".into(),
                keywords: vec!["급여".into(), "월급".into()],
                default: false,
                metadata: serde_json::Value::Null,
            },
            Choice::Full {
                value: "general".into(),
                display: "일반".into(),
                keywords: vec![],
                default: true,
                metadata: serde_json::Value::Null,
            },
        ]
    }

    #[test]
    fn exact_value_match_wins() {
        let cs = choices();
        assert_eq!(best_choice_match("general", &cs).unwrap().value(), "general");
    }

    #[test]
    fn keyword_match_wins_over_fuzzy() {
        let cs = choices();
        assert_eq!(
            best_choice_match("저는 월급 받는 통장이에요", &cs).unwrap().value(),
            "salary_transfer"
        );
    }

    #[test]
    fn fuzzy_match_on_display_typo() {
        let cs = choices();
        assert_eq!(
            best_choice_match("급여이채", &cs).unwrap().value(),
            "salary_transfer"
        );
    }

    #[test]
    fn unrelated_text_has_no_match() {
        let cs = choices();
        assert!(best_choice_match("오늘 날씨가 좋네요", &cs).is_none());
    }
}
