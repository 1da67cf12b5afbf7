//! Shared error taxonomy (§7). Each kind named here is a *kind*, not a
//! type hierarchy — concrete crates (`banking-scenario-engine`,
//! `banking-router`, `banking-retrieval`, ...) define their own
//! `thiserror` enum and compose into `banking-driver::TurnError` via
//! `#[from]`, mirroring the teacher's `OrchError::OperatorError(#[from]
//! OperatorError)` pattern.

use thiserror::Error;

/// A captured value failed a type/range check (§7 `ValidationError`).
/// Always surfaced as a re-prompt naming the field — never silently
/// dropped.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// The field's value was missing where one was required.
    #[error("{field} is required")]
    Missing {
        /// The offending field key.
        field: String,
    },
    /// A number field fell outside its declared range.
    #[error("{field}: {message}")]
    OutOfRange {
        /// The offending field key.
        field: String,
        /// Human-readable (Korean) message naming the violated limit.
        message: String,
    },
    /// A text/choice field failed a format heuristic (address minimum
    /// length, name character count, phone format, ...).
    #[error("{field}: {message}")]
    Malformed {
        /// The offending field key.
        field: String,
        /// Human-readable (Korean) message.
        message: String,
    },
}

/// The entity extractor could not parse the LLM's JSON, or its pattern
/// path failed outright (§7 `ExtractionError`). Recovered locally — never
/// surfaced to the user on its own.
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    /// The LLM path returned JSON that didn't parse or didn't validate.
    #[error("could not parse extraction JSON: {0}")]
    InvalidJson(String),
    /// Neither the pattern path nor the LLM path yielded a usable value.
    #[error("no value could be extracted for {0}")]
    NoMatch(String),
}
