//! Loads the prompt YAML file (§6 "Prompt YAML") into an immutable,
//! `Arc`-shared [`PromptSet`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level prompt sections every prompt file must declare (§6).
pub const REQUIRED_SECTIONS: &[&str] = &[
    "main_agent",
    "scenario_agent",
    "qa_agent",
    "entity_extraction",
    "intent_classification",
    "service_selection",
    "verification",
];

/// Section name -> prompt name -> template string, with
/// `{placeholder}` interpolation left for the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct PromptSet {
    sections: HashMap<String, HashMap<String, String>>,
}

impl PromptSet {
    /// Look up a template by section and prompt name.
    pub fn get(&self, section: &str, name: &str) -> Option<&str> {
        self.sections.get(section)?.get(name).map(String::as_str)
    }

    /// All prompt names declared under a section.
    pub fn section(&self, section: &str) -> Option<&HashMap<String, String>> {
        self.sections.get(section)
    }
}

/// Load the prompt YAML file, checking that every required section
/// (§6) is present.
pub fn load(path: impl AsRef<Path>) -> Result<Arc<PromptSet>, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e.to_string(),
    })?;

    let prompts: PromptSet = serde_yaml::from_str(&text).map_err(|e| ConfigError::PromptParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    for section in REQUIRED_SECTIONS {
        if !prompts.sections.contains_key(*section) {
            return Err(ConfigError::PromptMissingSection {
                path: path.display().to_string(),
                section: section.to_string(),
            });
        }
    }

    tracing::info!(path = %path.display(), sections = prompts.sections.len(), "loaded prompts");
    Ok(Arc::new(prompts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn well_formed_yaml() -> &'static str {
        r#"
main_agent:
  classify: "분류해주세요: {utterance}"
scenario_agent:
  next_stage: "다음 단계: {stage}"
qa_agent:
  answer: "답변: {context}"
entity_extraction:
  extract: "추출: {field}"
intent_classification:
  classify: "의도: {utterance}"
service_selection:
  select: "상품: {options}"
verification:
  confirm: "확인: {value}"
"#
    }

    #[test]
    fn loads_well_formed_prompts() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{}", well_formed_yaml()).unwrap();

        let prompts = load(f.path()).unwrap();
        assert_eq!(
            prompts.get("main_agent", "classify"),
            Some("분류해주세요: {utterance}")
        );
    }

    #[test]
    fn missing_required_section_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "main_agent:\n  classify: \"x\"\n").unwrap();

        let result = load(f.path());
        assert!(matches!(
            result,
            Err(ConfigError::PromptMissingSection { .. })
        ));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not: [valid yaml").unwrap();

        let result = load(f.path());
        assert!(matches!(result, Err(ConfigError::PromptParse { .. })));
    }
}
