//! Entity extraction (§4.2): fast pattern path, LLM path, and the
//! `EntityExtractionWorker` that the turn driver dispatches as
//! `invoke_scenario_agent`'s entity-extraction sub-step.

use std::collections::HashMap;

use async_trait::async_trait;
use banking_llm::{Provider, ProviderRequest, ProviderMessage};
use banking_types::{
    CollectedValue, ConversationPatch, ConversationState, FieldSpec, FieldType,
};
use banking_worker::{WorkerDyn, WorkerError, WorkerOutput};
use serde::{Deserialize, Serialize};

use crate::numeral;
use crate::patterns::{self, Patterns};
use crate::similarity;

/// Result of one extraction pass over an utterance (§4.2 contract).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    /// Field key -> extracted value.
    pub extracted: HashMap<String, CollectedValue>,
    /// Overall confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Fields the extractor recognized as targeted but could not resolve
    /// confidently.
    pub unclear_fields: Vec<String>,
    /// Field key -> `(original, corrected)` note, when a typo was
    /// resolved ("넴" → "네").
    pub typo_corrections: HashMap<String, String>,
    /// Free-text trace of how the result was produced, surfaced in logs
    /// only.
    pub reasoning: String,
}

/// JSON shape the LLM path is prompted to return. Mirrors
/// [`ExtractionOutcome`] but with raw strings for numbers/booleans,
/// since the LLM cannot emit our tagged `CollectedValue` directly.
#[derive(Debug, Clone, Deserialize)]
struct LlmExtraction {
    #[serde(default)]
    extracted: HashMap<String, String>,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    unclear_fields: Vec<String>,
    #[serde(default)]
    typo_corrections: HashMap<String, String>,
    #[serde(default)]
    reasoning: String,
}

/// Run the deterministic fast path (§4.2a): short utterances or
/// well-defined patterns (phone numbers, Korean-numeral amounts,
/// yes/no synonyms, choice keywords). Returns `None` if nothing in the
/// utterance matches any unfilled field's pattern — callers fall
/// through to the LLM path.
pub fn fast_path(
    utterance: &str,
    fields: &[FieldSpec],
    patterns: &Patterns,
) -> Option<ExtractionOutcome> {
    let trimmed = utterance.trim();
    let mut extracted = HashMap::new();

    for field in fields {
        match field.field_type {
            FieldType::Text if field.key.contains("phone") || field.key.contains("mobile") => {
                if let Some(mobile) = patterns.match_mobile(trimmed) {
                    extracted.insert(field.key.clone(), CollectedValue::Text(mobile));
                }
            }
            FieldType::Text if field.key == "name" => {
                if patterns.match_name(trimmed) {
                    extracted.insert(field.key.clone(), CollectedValue::Text(trimmed.to_string()));
                }
            }
            FieldType::Boolean => {
                if let Some(b) = CollectedValue::coerce_bool_str(trimmed) {
                    extracted.insert(field.key.clone(), CollectedValue::Boolean(b));
                }
            }
            FieldType::Number if trimmed.chars().count() <= 10 => {
                if let Ok(n) = trimmed.parse::<i64>() {
                    extracted.insert(field.key.clone(), CollectedValue::Number(n));
                } else if let Some(n) = numeral::convert_manwon(trimmed) {
                    extracted.insert(field.key.clone(), CollectedValue::Number(n));
                }
            }
            FieldType::Choice => {
                if let Some(choice) = similarity::best_choice_match(trimmed, &field.choices) {
                    if !choice.keywords().is_empty()
                        || choice.value() == trimmed
                        || choice.display() == trimmed
                    {
                        extracted.insert(field.key.clone(), CollectedValue::Choice(choice.value().to_string()));
                    }
                }
            }
            _ => {}
        }
    }

    if extracted.is_empty() {
        return None;
    }

    Some(ExtractionOutcome {
        extracted,
        confidence: 0.9,
        unclear_fields: Vec::new(),
        typo_corrections: HashMap::new(),
        reasoning: "matched deterministic pattern".to_string(),
    })
}

fn build_llm_prompt(utterance: &str, fields: &[FieldSpec], last_assistant_prompt: Option<&str>) -> String {
    let mut field_lines = String::new();
    for f in fields {
        field_lines.push_str(&format!(
            "- {} ({:?}){}\n",
            f.key,
            f.field_type,
            f.description
                .as_ref()
                .map(|d| format!(": {d}"))
                .unwrap_or_default()
        ));
    }

    format!(
        "다음 발화에서 아래 필드 값을 추출하세요. 사용자가 명시적으로 말한 값만 \
         추출하고, 기본값을 임의로 채우지 마세요. 1회 이체한도와 1일 이체한도를 \
         혼동하지 마세요. 한글 숫자(예: 오백만원, 일억)를 만원 단위 정수로 \
         변환하세요.\n\n직전 질문: {}\n필드:\n{}\n발화: {}\n\nJSON으로만 응답하세요: \
         {{\"extracted\": {{...}}, \"confidence\": 0.0-1.0, \"unclear_fields\": [...], \
         \"typo_corrections\": {{...}}, \"reasoning\": \"...\"}}",
        last_assistant_prompt.unwrap_or(""),
        field_lines,
        utterance,
    )
}

fn coerce_llm_value(field: &FieldSpec, raw: &str) -> Option<CollectedValue> {
    match field.field_type {
        FieldType::Text => Some(CollectedValue::Text(raw.to_string())),
        FieldType::Boolean => CollectedValue::coerce_bool_str(raw).map(CollectedValue::Boolean),
        FieldType::Number => raw
            .parse::<i64>()
            .ok()
            .or_else(|| numeral::convert_manwon(raw))
            .map(CollectedValue::Number),
        FieldType::Choice => {
            similarity::best_choice_match(raw, &field.choices).map(|c| CollectedValue::Choice(c.value().to_string()))
        }
    }
}

/// Run the LLM path (§4.2b): ask the provider for a strict-JSON
/// extraction, then coerce each returned string per `FieldSpec::type`.
/// A JSON parse failure falls back to pattern-only extraction at
/// confidence 0.5, per §7 `ExtractionError` recovery policy.
pub async fn llm_path<P: Provider>(
    provider: &P,
    utterance: &str,
    fields: &[FieldSpec],
    last_assistant_prompt: Option<&str>,
    patterns: &Patterns,
) -> ExtractionOutcome {
    let prompt = build_llm_prompt(utterance, fields, last_assistant_prompt);
    let request = ProviderRequest::json(vec![ProviderMessage::user(prompt)]).with_temperature(0.1);

    let response = match provider.json_llm(request).await {
        Ok(r) => r,
        Err(_) => return degrade_to_pattern_only(utterance, fields, patterns),
    };

    let parsed: LlmExtraction = match serde_json::from_str(&response.text) {
        Ok(p) => p,
        Err(_) => return degrade_to_pattern_only(utterance, fields, patterns),
    };

    let mut extracted = HashMap::new();
    for field in fields {
        if let Some(raw) = parsed.extracted.get(&field.key) {
            if let Some(value) = coerce_llm_value(field, raw) {
                if let Err(message) = validate_bounds(field, &value) {
                    tracing::debug!(field = %field.key, %message, "extracted value out of range");
                    continue;
                }
                extracted.insert(field.key.clone(), value);
            }
        }
    }

    ExtractionOutcome {
        extracted,
        confidence: parsed.confidence,
        unclear_fields: parsed.unclear_fields,
        typo_corrections: parsed.typo_corrections,
        reasoning: parsed.reasoning,
    }
}

fn validate_bounds(field: &FieldSpec, value: &CollectedValue) -> Result<(), String> {
    let CollectedValue::Number(n) = value else {
        return Ok(());
    };
    match field.key.as_str() {
        "payment_day" => patterns::validate_payment_day(*n),
        "transfer_limit_per_time" => patterns::validate_transfer_limit_per_time(*n),
        "transfer_limit_per_day" => patterns::validate_transfer_limit_per_day(*n),
        _ => Ok(()),
    }
}

fn degrade_to_pattern_only(utterance: &str, fields: &[FieldSpec], patterns: &Patterns) -> ExtractionOutcome {
    let mut outcome = fast_path(utterance, fields, patterns).unwrap_or_default();
    outcome.confidence = 0.5;
    outcome.reasoning = "LLM JSON extraction failed; degraded to pattern-only".to_string();
    outcome
}

/// Opaque input the driver hands this worker: the unfilled `FieldSpec`s
/// for the current stage (§4.2 contract: "given (utterance, required
/// FieldSpecs, ...)").
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionInput {
    /// Fields still missing a value this turn.
    pub fields: Vec<FieldSpec>,
}

/// Worker implementation for C2, generic over the LLM provider used for
/// the slow path.
pub struct EntityExtractionWorker<P: Provider> {
    provider: P,
    patterns: Patterns,
}

impl<P: Provider> EntityExtractionWorker<P> {
    /// Build the worker around a concrete provider.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            patterns: Patterns::new(),
        }
    }
}

#[async_trait]
impl<P: Provider> WorkerDyn for EntityExtractionWorker<P> {
    fn name(&self) -> &str {
        "entity_extraction"
    }

    fn description(&self) -> &str {
        "Extracts typed slot values from the user's utterance via pattern and LLM paths"
    }

    async fn call(
        &self,
        state: &ConversationState,
        input: serde_json::Value,
    ) -> Result<WorkerOutput, WorkerError> {
        let input: ExtractionInput = serde_json::from_value(input)
            .map_err(|e| WorkerError::InvalidInput(e.to_string()))?;

        let utterance = state
            .messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, banking_types::Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let outcome = match fast_path(utterance, &input.fields, &self.patterns) {
            Some(o) => o,
            None => {
                llm_path(
                    &self.provider,
                    utterance,
                    &input.fields,
                    state.last_assistant_prompt.as_deref(),
                    &self.patterns,
                )
                .await
            }
        };

        tracing::debug!(
            fields = outcome.extracted.len(),
            confidence = outcome.confidence,
            "entity extraction complete"
        );

        let payload = serde_json::to_value(&outcome)
            .map_err(|e| WorkerError::ExecutionFailed(e.to_string()))?;

        Ok(WorkerOutput {
            patch: ConversationPatch {
                collected_info_updates: outcome.extracted,
                ..Default::default()
            },
            payload,
        })
    }
}
