//! Loads and validates a scenario JSON file into an immutable,
//! `Arc`-shared [`Scenario`] (§1.1 "startup-initialised singletons").

use std::path::Path;
use std::sync::Arc;

use banking_types::Scenario;

use crate::error::ConfigError;

/// Load a scenario from a JSON file, validating it before returning.
///
/// Validation failures (§3: unresolvable transitions, duplicate field
/// keys, missing initial stage, ...) are fatal — this is only ever
/// called once per product, at process startup.
pub fn load(path: impl AsRef<Path>) -> Result<Arc<Scenario>, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e.to_string(),
    })?;

    let scenario: Scenario = serde_json::from_str(&text).map_err(|e| ConfigError::ScenarioParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    scenario.validate()?;
    tracing::info!(path = %path.display(), stages = scenario.stages.len(), "loaded scenario");

    Ok(Arc::new(scenario))
}
