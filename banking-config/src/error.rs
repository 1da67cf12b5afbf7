//! Config loading errors (§7 `ConfigError`: "scenario/prompt/corpus
//! missing or malformed at startup — fatal, the process fails to
//! start").

use banking_types::ScenarioValidationError;
use thiserror::Error;

/// Why a config load failed. Every variant here is fatal at startup —
/// there is no recovery path, unlike the per-turn error kinds in
/// `banking-types::error`.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Couldn't read a config file or corpus directory from disk.
    #[error("reading {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: String,
        /// The underlying IO error, as text.
        source: String,
    },

    /// A scenario file's JSON didn't parse.
    #[error("parsing scenario JSON at {path}: {message}")]
    ScenarioParse {
        /// The path that failed to parse.
        path: String,
        /// The underlying parse error, as text.
        message: String,
    },

    /// A scenario parsed but failed cross-reference validation (§3
    /// "validated at load time").
    #[error(transparent)]
    ScenarioInvalid(#[from] ScenarioValidationError),

    /// A prompt file's YAML didn't parse.
    #[error("parsing prompt YAML at {path}: {message}")]
    PromptParse {
        /// The path that failed to parse.
        path: String,
        /// The underlying parse error, as text.
        message: String,
    },

    /// A prompt file was missing one of the required top-level
    /// sections (§6: `main_agent`, `scenario_agent`, `qa_agent`,
    /// `entity_extraction`, `intent_classification`,
    /// `service_selection`, `verification`).
    #[error("prompt file at {path} is missing required section '{section}'")]
    PromptMissingSection {
        /// The path that was missing a section.
        path: String,
        /// The missing section name.
        section: String,
    },

    /// A knowledge-base corpus directory contained no markdown files.
    #[error("knowledge-base corpus at {path} contains no markdown documents")]
    CorpusEmpty {
        /// The corpus directory that was empty.
        path: String,
    },
}
