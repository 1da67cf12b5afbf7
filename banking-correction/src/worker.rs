//! `CorrectionWorker`: the C3 info-modification agent, registered
//! under `personal_info_correction` (§4.3).

use std::collections::HashMap;

use async_trait::async_trait;
use banking_llm::{Provider, ProviderMessage, ProviderRequest};
use banking_nlu::Patterns;
use banking_types::{CollectedValue, ConversationPatch, ConversationState, FieldSpec, Role};
use banking_worker::{WorkerDyn, WorkerError, WorkerOutput};
use serde::{Deserialize, Serialize};

use crate::detect::{detect_new_value, detect_target_field, TargetField};

/// Opaque input the driver hands this worker: the scenario's full field
/// list (needed for explicit-mention detection, §4.3 step 1(i)) and
/// whether the current stage is a confirmation stage (§4.3 step 4).
#[derive(Debug, Clone, Deserialize)]
pub struct CorrectionInput {
    /// Every field the scenario can collect, used for field-mention and
    /// address-ambiguity detection.
    pub fields: Vec<FieldSpec>,
    /// Whether `current_scenario_stage_id` is a confirmation-style
    /// stage — changes how the "yes" branch of step 4 replies.
    #[serde(default)]
    pub is_confirmation_stage: bool,
}

/// What the driver should do with this worker's result, carried in
/// [`WorkerOutput::payload`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionReply {
    /// The reply text to show the user this turn.
    pub reply: String,
    /// Whether this reply is final — the synthesizer (C9) should not
    /// run its own priority chain over it.
    pub is_final: bool,
    /// Set when the additional-modifications loop has ended and the
    /// scenario engine should advance to the next stage and emit its
    /// prompt (§4.3 step 5).
    pub advance_scenario: bool,
}

impl CorrectionReply {
    fn final_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            is_final: true,
            advance_scenario: false,
        }
    }
}

fn output(patch: ConversationPatch, reply: CorrectionReply) -> Result<WorkerOutput, WorkerError> {
    let payload =
        serde_json::to_value(&reply).map_err(|e| WorkerError::ExecutionFailed(e.to_string()))?;
    Ok(WorkerOutput { patch, payload })
}

/// Worker implementation for C3, generic over the LLM provider used for
/// the ambiguous-target classification rung (§4.3 step 1(iv)).
pub struct CorrectionWorker<P: Provider> {
    provider: P,
    patterns: Patterns,
}

impl<P: Provider> CorrectionWorker<P> {
    /// Build the worker around a concrete provider.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            patterns: Patterns::new(),
        }
    }

    async fn classify_ambiguous(&self, utterance: &str, candidates: &[String]) -> Option<String> {
        let prompt = format!(
            "사용자가 다음 발화로 정보를 수정하려 합니다. 아래 후보 필드 중 하나를 \
             선택하거나, 확신할 수 없으면 \"unclear\"라고만 답하세요.\n\n발화: {}\n\
             후보: {}\n\nJSON으로만 응답하세요: {{\"field\": \"...\", \"confidence\": 0.0-1.0}}",
            utterance,
            candidates.join(", ")
        );
        let request = ProviderRequest::json(vec![ProviderMessage::user(prompt)]).with_temperature(0.1);
        let response = self.provider.json_llm(request).await.ok()?;

        #[derive(Deserialize)]
        struct Classification {
            field: String,
            confidence: f64,
        }
        let parsed: Classification = serde_json::from_str(&response.text).ok()?;
        // §4.3 step 1(iv): LLM classification carries a lowered
        // confidence ceiling — below it, the ambiguity still stands.
        if parsed.confidence > 0.6 && candidates.contains(&parsed.field) {
            Some(parsed.field)
        } else {
            None
        }
    }

    fn ambiguity_question(&self, candidates: &[String], fields: &[FieldSpec]) -> String {
        let names: Vec<&str> = candidates
            .iter()
            .filter_map(|key| fields.iter().find(|f| &f.key == key))
            .map(|f| f.display_name.as_str())
            .collect();
        format!("{}인가요?", names.join(", "))
    }

    async fn handle_new_correction(
        &self,
        utterance: &str,
        state: &ConversationState,
        input: &CorrectionInput,
    ) -> Result<WorkerOutput, WorkerError> {
        let target = detect_target_field(
            utterance,
            state.current_modification_context.as_deref(),
            &input.fields,
            &self.patterns,
        );

        let field_key = match target {
            TargetField::Found(key) => key,
            TargetField::Ambiguous(candidates) => {
                match self.classify_ambiguous(utterance, &candidates).await {
                    Some(resolved) => resolved,
                    None => {
                        // Ambiguity rule (§4.3): never silently choose.
                        let question = self.ambiguity_question(&candidates, &input.fields);
                        return output(
                            ConversationPatch::default(),
                            CorrectionReply::final_reply(question),
                        );
                    }
                }
            }
            TargetField::None => {
                return output(
                    ConversationPatch::default(),
                    CorrectionReply::final_reply("어떤 정보를 수정하고 싶으신지 말씀해 주세요."),
                );
            }
        };

        let field = input
            .fields
            .iter()
            .find(|f| f.key == field_key)
            .ok_or_else(|| WorkerError::InvalidInput(format!("unknown field: {field_key}")))?;

        let existing_value = state.collected_info.get(&field_key);
        let new_value = detect_new_value(utterance, field, &self.patterns, existing_value);

        match new_value {
            None => {
                // Step 2: no replacement value yet — ask for it.
                let patch = ConversationPatch {
                    current_modification_context: Some(Some(field_key.clone())),
                    correction_mode: Some(true),
                    ..Default::default()
                };
                output(
                    patch,
                    CorrectionReply::final_reply(format!(
                        "{}를(을) 어떻게 수정해드릴까요?",
                        field.display_name
                    )),
                )
            }
            Some(value) => {
                // Step 3: propose the change, apply optimistically.
                let old_value = state.collected_info.get(&field_key).cloned();
                let mut original = HashMap::new();
                if let Some(old) = old_value {
                    original.insert(field_key.clone(), old);
                }
                let mut pending = HashMap::new();
                pending.insert(field_key.clone(), value.clone());

                let mut collected_info_updates = HashMap::new();
                collected_info_updates.insert(field_key.clone(), value.clone());

                let patch = ConversationPatch {
                    collected_info_updates,
                    correction_mode: Some(true),
                    pending_modifications: Some(pending),
                    original_values_before_modification: Some(original),
                    current_modification_context: Some(None),
                    ..Default::default()
                };
                output(
                    patch,
                    CorrectionReply::final_reply(format!(
                        "{}를(을) {}로 변경하겠습니다. 맞으실까요?",
                        field.display_name,
                        value.display_string()
                    )),
                )
            }
        }
    }

    async fn handle_confirmation_branch(
        &self,
        utterance: &str,
        state: &ConversationState,
        input: &CorrectionInput,
    ) -> Result<WorkerOutput, WorkerError> {
        match CollectedValue::coerce_bool_str(utterance) {
            Some(true) => {
                if input.is_confirmation_stage {
                    let patch = ConversationPatch {
                        pending_modifications: Some(HashMap::new()),
                        original_values_before_modification: Some(HashMap::new()),
                        waiting_for_additional_modifications: Some(true),
                        ..Default::default()
                    };
                    output(
                        patch,
                        CorrectionReply::final_reply("변경하겠습니다. 다른 수정사항 있으실까요?"),
                    )
                } else {
                    let patch = ConversationPatch {
                        pending_modifications: Some(HashMap::new()),
                        original_values_before_modification: Some(HashMap::new()),
                        correction_mode: Some(false),
                        ..Default::default()
                    };
                    output(patch, CorrectionReply::final_reply("수정되었습니다."))
                }
            }
            Some(false) => {
                // Roll back to the pre-edit snapshot.
                let patch = ConversationPatch {
                    collected_info_updates: state.original_values_before_modification.clone(),
                    pending_modifications: Some(HashMap::new()),
                    original_values_before_modification: Some(HashMap::new()),
                    ..Default::default()
                };
                output(
                    patch,
                    CorrectionReply::final_reply("어떤 정보를 수정하고 싶으신지 다시 말씀해주세요."),
                )
            }
            None => {
                // A different value or field: accept the pending edit
                // as-is (it is already applied optimistically) and
                // restart step 2 with the new utterance.
                let cleared = ConversationPatch {
                    pending_modifications: Some(HashMap::new()),
                    original_values_before_modification: Some(HashMap::new()),
                    ..Default::default()
                };
                let mut result = self.handle_new_correction(utterance, state, input).await?;
                let mut merged = cleared;
                merged.collected_info_updates = result.patch.collected_info_updates.clone();
                merged.correction_mode = result.patch.correction_mode;
                merged.current_modification_context = result.patch.current_modification_context.clone();
                merged.pending_modifications = result
                    .patch
                    .pending_modifications
                    .clone()
                    .or(merged.pending_modifications);
                merged.original_values_before_modification = result
                    .patch
                    .original_values_before_modification
                    .clone()
                    .or(merged.original_values_before_modification);
                result.patch = merged;
                Ok(result)
            }
        }
    }

    async fn handle_additional_modifications_loop(
        &self,
        utterance: &str,
        state: &ConversationState,
        input: &CorrectionInput,
    ) -> Result<WorkerOutput, WorkerError> {
        let done = utterance.contains('없') || CollectedValue::coerce_bool_str(utterance) == Some(false);
        if done {
            let mut collected_info_updates = HashMap::new();
            collected_info_updates.insert("confirm_personal_info".to_string(), CollectedValue::Boolean(true));
            let patch = ConversationPatch {
                collected_info_updates,
                waiting_for_additional_modifications: Some(false),
                correction_mode: Some(false),
                ..Default::default()
            };
            return output(
                patch,
                CorrectionReply {
                    reply: String::new(),
                    is_final: false,
                    advance_scenario: true,
                },
            );
        }

        let mut result = self.handle_new_correction(utterance, state, input).await?;
        result.patch.waiting_for_additional_modifications = Some(false);
        Ok(result)
    }
}

#[async_trait]
impl<P: Provider> WorkerDyn for CorrectionWorker<P> {
    fn name(&self) -> &str {
        "personal_info_correction"
    }

    fn description(&self) -> &str {
        "Walks the user through amending a previously captured field (§4.3)"
    }

    async fn call(
        &self,
        state: &ConversationState,
        input: serde_json::Value,
    ) -> Result<WorkerOutput, WorkerError> {
        let input: CorrectionInput =
            serde_json::from_value(input).map_err(|e| WorkerError::InvalidInput(e.to_string()))?;

        let utterance = state
            .messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        // Correction-mode cleanup (§4.3): stray flags outside a
        // customer-info context get cleared and routed back.
        if !input.is_confirmation_stage
            && !state.correction_mode
            && !state.waiting_for_additional_modifications
            && state.pending_modifications.is_empty()
            && state.current_modification_context.is_none()
        {
            return output(
                ConversationPatch::default(),
                CorrectionReply {
                    reply: String::new(),
                    is_final: false,
                    advance_scenario: true,
                },
            );
        }

        if state.waiting_for_additional_modifications {
            return self
                .handle_additional_modifications_loop(utterance, state, &input)
                .await;
        }

        if !state.pending_modifications.is_empty() {
            return self.handle_confirmation_branch(utterance, state, &input).await;
        }

        self.handle_new_correction(utterance, state, &input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_llm::MockProvider;
    use banking_types::{FieldType, Message};

    fn address_fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec {
                key: "address".into(),
                display_name: "집주소".into(),
                field_type: FieldType::Text,
                required: true,
                choices: Vec::new(),
                unit: None,
                description: None,
                show_when: None,
                parent_field: None,
                default: None,
                group: "basic".into(),
            },
            FieldSpec {
                key: "work_address".into(),
                display_name: "직장주소".into(),
                field_type: FieldType::Text,
                required: false,
                choices: Vec::new(),
                unit: None,
                description: None,
                show_when: None,
                parent_field: None,
                default: None,
                group: "basic".into(),
            },
        ]
    }

    fn state_with_utterance(text: &str) -> ConversationState {
        let mut state = ConversationState::new();
        state.messages.push(Message::user(text));
        state
    }

    #[tokio::test]
    async fn proposes_change_when_field_context_and_value_both_present() {
        let worker = CorrectionWorker::new(MockProvider::with_text("{}"));
        let mut state = state_with_utterance("역삼동 123번지요");
        state.current_modification_context = Some("address".to_string());
        let input = serde_json::to_value(CorrectionInput {
            fields: address_fields(),
            is_confirmation_stage: false,
        })
        .unwrap();

        let result = worker.call(&state, input).await.unwrap();
        assert!(result.patch.pending_modifications.is_some());
        assert_eq!(
            result.patch.collected_info_updates.get("address"),
            Some(&CollectedValue::Text("역삼동 123번지요".to_string()))
        );
    }

    #[tokio::test]
    async fn asks_for_value_when_only_field_named() {
        let worker = CorrectionWorker::new(MockProvider::with_text("{}"));
        let state = state_with_utterance("집주소 수정하고 싶어요");
        let input = serde_json::to_value(CorrectionInput {
            fields: address_fields(),
            is_confirmation_stage: false,
        })
        .unwrap();

        let result = worker.call(&state, input).await.unwrap();
        assert_eq!(
            result.patch.current_modification_context,
            Some(Some("address".to_string()))
        );
    }

    #[tokio::test]
    async fn confirmation_yes_at_confirmation_stage_opens_additional_loop() {
        let worker = CorrectionWorker::new(MockProvider::with_text("{}"));
        let mut state = state_with_utterance("네 맞아요");
        state
            .pending_modifications
            .insert("address".into(), CollectedValue::Text("역삼동".into()));
        let input = serde_json::to_value(CorrectionInput {
            fields: address_fields(),
            is_confirmation_stage: true,
        })
        .unwrap();

        let result = worker.call(&state, input).await.unwrap();
        assert_eq!(result.patch.waiting_for_additional_modifications, Some(true));
    }

    #[tokio::test]
    async fn confirmation_no_rolls_back() {
        let worker = CorrectionWorker::new(MockProvider::with_text("{}"));
        let mut state = state_with_utterance("아니요");
        state
            .pending_modifications
            .insert("address".into(), CollectedValue::Text("역삼동".into()));
        state
            .original_values_before_modification
            .insert("address".into(), CollectedValue::Text("논현동".into()));
        let input = serde_json::to_value(CorrectionInput {
            fields: address_fields(),
            is_confirmation_stage: false,
        })
        .unwrap();

        let result = worker.call(&state, input).await.unwrap();
        assert_eq!(
            result.patch.collected_info_updates.get("address"),
            Some(&CollectedValue::Text("논현동".to_string()))
        );
    }

    #[tokio::test]
    async fn additional_modifications_loop_ends_on_no_more() {
        let worker = CorrectionWorker::new(MockProvider::with_text("{}"));
        let mut state = state_with_utterance("없어요 없습니다");
        state.waiting_for_additional_modifications = true;
        let input = serde_json::to_value(CorrectionInput {
            fields: address_fields(),
            is_confirmation_stage: false,
        })
        .unwrap();

        let result = worker.call(&state, input).await.unwrap();
        let reply: CorrectionReply = serde_json::from_value(result.payload).unwrap();
        assert!(reply.advance_scenario);
        assert_eq!(result.patch.waiting_for_additional_modifications, Some(false));
    }

    #[tokio::test]
    async fn stray_flags_outside_customer_info_context_are_cleared() {
        let worker = CorrectionWorker::new(MockProvider::with_text("{}"));
        let state = state_with_utterance("오늘 날씨 어때요");
        let input = serde_json::to_value(CorrectionInput {
            fields: address_fields(),
            is_confirmation_stage: false,
        })
        .unwrap();

        let result = worker.call(&state, input).await.unwrap();
        let reply: CorrectionReply = serde_json::from_value(result.payload).unwrap();
        assert!(reply.advance_scenario);
    }
}
