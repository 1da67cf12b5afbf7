//! `show_when` mini-expression grammar (§4.8), shared by the scenario
//! engine's stage-completion check and the slot-visibility projector so
//! both evaluate field visibility identically.
//!
//! ```text
//! expr   := clause ( ('&&' | '||') clause )*
//! clause := KEY ' == ' LITERAL
//!        |  KEY ' != ' LITERAL
//!        |  KEY ' != null'
//!        |  KEY ' == null'
//! ```
//! `LITERAL` is `'true'`, `'false'`, a single/double-quoted string, or a
//! bare number. `null` tests whether the value is absent/empty/false.

use std::collections::HashMap;

use thiserror::Error;

use crate::collected_value::CollectedValue;

/// A parsed `show_when` literal.
#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Bool(bool),
    Str(String),
    Num(i64),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
struct Clause {
    key: String,
    op: Op,
    literal: Literal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Joiner {
    And,
    Or,
}

/// A parsed `show_when` expression, evaluated against a turn's
/// `collected_info`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowWhenExpr {
    first: Clause,
    rest: Vec<(Joiner, Clause)>,
}

/// A `show_when` source string failed to parse.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ShowWhenError {
    /// The expression was empty or had no recognizable clause.
    #[error("empty show_when expression")]
    Empty,
    /// A clause didn't match any grammar production.
    #[error("malformed clause: {0}")]
    MalformedClause(String),
}

fn parse_literal(raw: &str) -> Literal {
    let raw = raw.trim();
    if raw == "true" {
        return Literal::Bool(true);
    }
    if raw == "false" {
        return Literal::Bool(false);
    }
    if raw == "null" {
        return Literal::Null;
    }
    if (raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2)
        || (raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2)
    {
        return Literal::Str(raw[1..raw.len() - 1].to_string());
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Literal::Num(n);
    }
    Literal::Str(raw.to_string())
}

fn parse_clause(raw: &str) -> Result<Clause, ShowWhenError> {
    let raw = raw.trim();
    if let Some(key) = raw.strip_suffix("!= null").map(str::trim) {
        return Ok(Clause {
            key: key.to_string(),
            op: Op::Ne,
            literal: Literal::Null,
        });
    }
    if let Some(key) = raw.strip_suffix("== null").map(str::trim) {
        return Ok(Clause {
            key: key.to_string(),
            op: Op::Eq,
            literal: Literal::Null,
        });
    }
    if let Some((key, lit)) = raw.split_once("!=") {
        return Ok(Clause {
            key: key.trim().to_string(),
            op: Op::Ne,
            literal: parse_literal(lit),
        });
    }
    if let Some((key, lit)) = raw.split_once("==") {
        return Ok(Clause {
            key: key.trim().to_string(),
            op: Op::Eq,
            literal: parse_literal(lit),
        });
    }
    Err(ShowWhenError::MalformedClause(raw.to_string()))
}

/// Parse a `show_when` source string into an evaluable expression.
/// Called once per field at scenario-load time, never per turn.
pub fn parse(src: &str) -> Result<ShowWhenExpr, ShowWhenError> {
    let src = src.trim();
    if src.is_empty() {
        return Err(ShowWhenError::Empty);
    }

    let mut tokens: Vec<(Option<Joiner>, &str)> = Vec::new();
    let mut remainder = src;
    loop {
        if let Some(idx) = remainder.find("&&") {
            if let Some(or_idx) = remainder.find("||") {
                if or_idx < idx {
                    tokens.push((None, &remainder[..or_idx]));
                    tokens.last_mut().unwrap().0 = Some(Joiner::Or);
                    remainder = &remainder[or_idx + 2..];
                    continue;
                }
            }
            tokens.push((Some(Joiner::And), &remainder[..idx]));
            remainder = &remainder[idx + 2..];
        } else if let Some(idx) = remainder.find("||") {
            tokens.push((Some(Joiner::Or), &remainder[..idx]));
            remainder = &remainder[idx + 2..];
        } else {
            tokens.push((None, remainder));
            break;
        }
    }

    // The joiner stored alongside a clause is the one that *preceded*
    // it in source order; shift so each clause after the first carries
    // its own preceding joiner.
    let mut clauses = Vec::new();
    let mut pending_joiner = None;
    for (trailing_joiner, text) in tokens {
        clauses.push((pending_joiner, parse_clause(text)?));
        pending_joiner = trailing_joiner;
    }

    let mut iter = clauses.into_iter();
    let (_, first) = iter.next().ok_or(ShowWhenError::Empty)?;
    let rest = iter.map(|(j, c)| (j.unwrap_or(Joiner::And), c)).collect();

    Ok(ShowWhenExpr { first, rest })
}

fn literal_matches(value: Option<&CollectedValue>, literal: &Literal) -> bool {
    match literal {
        Literal::Null => value.is_none() || !value.map(CollectedValue::as_bool).unwrap_or(false),
        Literal::Bool(b) => value.map(CollectedValue::as_bool) == Some(*b),
        Literal::Str(s) => value.map(|v| v.display_string()) == Some(s.clone()),
        Literal::Num(n) => matches!(value, Some(CollectedValue::Number(v)) if v == n),
    }
}

fn eval_clause(clause: &Clause, collected: &HashMap<String, CollectedValue>) -> bool {
    let value = collected.get(&clause.key);
    let matches = literal_matches(value, &clause.literal);
    match clause.op {
        Op::Eq => matches,
        Op::Ne => !matches,
    }
}

/// Evaluate a parsed expression against `collected_info`. Pure and
/// deterministic (L1): the same expression and the same map always
/// produce the same result.
pub fn eval(expr: &ShowWhenExpr, collected: &HashMap<String, CollectedValue>) -> bool {
    let mut result = eval_clause(&expr.first, collected);
    for (joiner, clause) in &expr.rest {
        let rhs = eval_clause(clause, collected);
        result = match joiner {
            Joiner::And => result && rhs,
            Joiner::Or => result || rhs,
        };
    }
    result
}

/// Parse and evaluate in one step. On a parse error, fails open (the
/// field is shown) per §4.8's evaluation-error policy.
pub fn apply(src: &str, collected: &HashMap<String, CollectedValue>) -> bool {
    match parse(src) {
        Ok(expr) => eval(&expr, collected),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collected(pairs: &[(&str, CollectedValue)]) -> HashMap<String, CollectedValue> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn equality_on_string_literal() {
        let info = collected(&[("services_selected", CollectedValue::Choice("all".into()))]);
        assert!(apply("services_selected == 'all'", &info));
        assert!(!apply("services_selected == 'mobile_only'", &info));
    }

    #[test]
    fn null_test_on_absent_key() {
        let info = collected(&[]);
        assert!(apply("address != null", &info) == false);
        assert!(apply("address == null", &info));
    }

    #[test]
    fn boolean_coercion_accepts_korean_vocabulary() {
        let info = collected(&[("use_internet_banking", CollectedValue::Text("네".into()))]);
        assert!(apply("use_internet_banking == true", &info));
    }

    #[test]
    fn and_or_combination() {
        let info = collected(&[
            ("a", CollectedValue::Boolean(true)),
            ("b", CollectedValue::Boolean(false)),
        ]);
        assert!(apply("a == true && b == false", &info));
        assert!(apply("a == true || b == true", &info));
        assert!(!apply("a == false && b == true", &info));
    }

    #[test]
    fn malformed_expression_fails_open() {
        let info = collected(&[]);
        assert!(apply("this is not a clause", &info));
    }

    #[test]
    fn number_literal_equality() {
        let info = collected(&[("payment_day", CollectedValue::Number(15))]);
        assert!(apply("payment_day == 15", &info));
        assert!(apply("payment_day != 20", &info));
    }
}
