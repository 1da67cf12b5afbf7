//! `ScenarioEngineWorker`: the C4 logic half of `invoke_scenario_agent`.
//! The driver runs the entity-extraction worker (C2) first and merges
//! its patch into the snapshot this worker sees, so `state.collected_info`
//! already reflects this turn's newly extracted slots by the time this
//! worker runs (§5 "each worker observes patches from all previous
//! workers of the same turn").

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use banking_llm::Provider;
use banking_types::{ConversationPatch, ConversationState, Scenario, Stage, StageKind};
use banking_worker::{WorkerDyn, WorkerError, WorkerOutput};
use serde::{Deserialize, Serialize};

use crate::completion::is_stage_complete;
use crate::group::{self, GroupModeResult};
use crate::subagents::{check_card_agent, internet_banking_agent};
use crate::transition::{chain_through, decide_next_stage};

/// Opaque input the router/driver passes on `invoke_scenario_agent`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioEngineInput {
    /// Intent classified by the router/extraction worker this turn, if any.
    #[serde(default)]
    pub intent: Option<String>,
}

/// The reply and control signals this worker hands back to the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioEngineReply {
    /// The message to surface, if this worker already has one (a
    /// completion message or a missing-field reprompt). `None` leaves
    /// response synthesis to C9 from the new stage's own prompt.
    pub message: Option<String>,
}

/// `WorkerDyn` for the scenario engine (C4), generic over the LLM
/// provider used for stage-transition arbitration.
pub struct ScenarioEngineWorker<P: Provider> {
    provider: P,
    scenario: Arc<Scenario>,
}

impl<P: Provider> ScenarioEngineWorker<P> {
    /// Build a worker bound to one loaded scenario.
    pub fn new(provider: P, scenario: Arc<Scenario>) -> Self {
        Self { provider, scenario }
    }

    fn run_subagent_if_applicable(&self, stage: &Stage, utterance: &str) -> HashMap<String, banking_types::CollectedValue> {
        if let StageKind::GroupCollect { group_ids, .. } = &stage.kind {
            if group_ids.iter().any(|g| g.contains("banking") || g.contains("limit")) {
                return internet_banking_agent(utterance).extracted;
            }
            if group_ids.iter().any(|g| g.contains("card")) {
                return check_card_agent(utterance).extracted;
            }
        }
        HashMap::new()
    }
}

#[async_trait]
impl<P: Provider> WorkerDyn for ScenarioEngineWorker<P> {
    fn name(&self) -> &str {
        "scenario_engine"
    }

    fn description(&self) -> &str {
        "Stage completion check, next-stage decision, and group-collect mode (C4)"
    }

    async fn call(
        &self,
        state: &ConversationState,
        input: serde_json::Value,
    ) -> Result<WorkerOutput, WorkerError> {
        let input: ScenarioEngineInput = if input.is_null() {
            ScenarioEngineInput::default()
        } else {
            serde_json::from_value(input).map_err(|e| WorkerError::InvalidInput(e.to_string()))?
        };

        let stage_id = state
            .current_scenario_stage_id
            .clone()
            .unwrap_or_else(|| self.scenario.initial_stage_id.clone());
        let Some(stage) = self.scenario.stage(&stage_id) else {
            return Err(WorkerError::ExecutionFailed(format!("unknown stage {stage_id:?}")));
        };

        let utterance = state
            .messages
            .iter()
            .rev()
            .find(|m| m.role == banking_types::Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let subagent_updates = self.run_subagent_if_applicable(stage, utterance);
        let mut collected = state.collected_info.clone();
        collected.extend(subagent_updates.clone());

        if stage.collects_multiple_info() {
            return self.handle_group_collect(stage, &collected, subagent_updates).await;
        }

        if !is_stage_complete(stage, &self.scenario, &collected) {
            return Ok(WorkerOutput {
                patch: ConversationPatch {
                    collected_info_updates: subagent_updates,
                    current_scenario_stage_id: Some(stage_id),
                    ..Default::default()
                },
                payload: serde_json::to_value(ScenarioEngineReply { message: None })
                    .map_err(|e| WorkerError::ExecutionFailed(e.to_string()))?,
            });
        }

        let next = decide_next_stage(&self.provider, stage, utterance, input.intent.as_deref())
            .await
            .unwrap_or_else(|| stage_id.clone());
        let resolved = chain_through(&self.provider, &self.scenario, next).await;

        let message = stage.completion_message.clone();
        Ok(WorkerOutput {
            patch: ConversationPatch {
                collected_info_updates: subagent_updates,
                current_scenario_stage_id: Some(resolved),
                ..Default::default()
            },
            payload: serde_json::to_value(ScenarioEngineReply { message })
                .map_err(|e| WorkerError::ExecutionFailed(e.to_string()))?,
        })
    }
}

impl<P: Provider> ScenarioEngineWorker<P> {
    async fn handle_group_collect(
        &self,
        stage: &Stage,
        collected: &HashMap<String, banking_types::CollectedValue>,
        subagent_updates: HashMap<String, banking_types::CollectedValue>,
    ) -> Result<WorkerOutput, WorkerError> {
        match group::step(stage, &self.scenario, collected) {
            GroupModeResult::Prompt { missing_fields, .. } => {
                let labels: Vec<String> = missing_fields
                    .iter()
                    .filter_map(|k| self.scenario.field(k))
                    .map(|f| f.display_name.clone())
                    .collect();
                let message = format!("{}를(을) 알려주세요.", labels.join(", "));
                Ok(WorkerOutput {
                    patch: ConversationPatch {
                        collected_info_updates: subagent_updates,
                        ..Default::default()
                    },
                    payload: serde_json::to_value(ScenarioEngineReply { message: Some(message) })
                        .map_err(|e| WorkerError::ExecutionFailed(e.to_string()))?,
                })
            }
            GroupModeResult::Complete { next_stage_id } => {
                let resolved = chain_through(&self.provider, &self.scenario, next_stage_id).await;
                let message = stage.completion_message.clone();
                Ok(WorkerOutput {
                    patch: ConversationPatch {
                        collected_info_updates: subagent_updates,
                        current_scenario_stage_id: Some(resolved),
                        ..Default::default()
                    },
                    payload: serde_json::to_value(ScenarioEngineReply { message })
                        .map_err(|e| WorkerError::ExecutionFailed(e.to_string()))?,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_llm::MockProvider;
    use banking_types::{FieldGroup, FieldSpec, FieldType, Message, ProductType, ResponseType, Transition};
    use std::collections::HashMap as Map;

    fn field(key: &str) -> FieldSpec {
        FieldSpec {
            key: key.into(),
            display_name: key.into(),
            field_type: FieldType::Text,
            required: true,
            choices: Vec::new(),
            unit: None,
            description: None,
            show_when: None,
            parent_field: None,
            default: None,
            group: "g".into(),
        }
    }

    fn slot_filling_scenario() -> Arc<Scenario> {
        let mut stages = Map::new();
        stages.insert(
            "ask_name".to_string(),
            Stage {
                id: "ask_name".into(),
                kind: StageKind::SlotFilling {
                    expected_info_key: "name".into(),
                },
                prompt: Some("성함이 어떻게 되세요?".into()),
                response_type: ResponseType::Narrative,
                choices: Vec::new(),
                visible_groups: Vec::new(),
                transitions: vec![Transition {
                    condition_description: "always".into(),
                    next_stage_id: "done".into(),
                    example_phrases: Vec::new(),
                }],
                default_next_stage_id: None,
                modifiable_fields: Vec::new(),
                completion_message: Some("감사합니다.".into()),
            },
        );
        stages.insert(
            "done".to_string(),
            Stage {
                id: "done".into(),
                kind: StageKind::Terminal,
                prompt: Some("완료되었습니다.".into()),
                response_type: ResponseType::Narrative,
                choices: Vec::new(),
                visible_groups: Vec::new(),
                transitions: Vec::new(),
                default_next_stage_id: None,
                modifiable_fields: Vec::new(),
                completion_message: None,
            },
        );
        Arc::new(Scenario {
            product_id: ProductType::DepositAccount,
            initial_stage_id: "ask_name".into(),
            stages,
            required_info_fields: vec![field("name")],
            field_groups: vec![FieldGroup {
                id: "g".into(),
                name: "g".into(),
                field_keys: vec!["name".into()],
            }],
            end_message: "상담이 종료되었습니다.".into(),
            display_labels: Map::new(),
        })
    }

    #[tokio::test]
    async fn stays_on_stage_when_required_field_still_missing() {
        let scenario = slot_filling_scenario();
        let worker = ScenarioEngineWorker::new(MockProvider::with_text("{}"), scenario);
        let mut state = ConversationState::new();
        state.current_scenario_stage_id = Some("ask_name".into());
        state.push_user_message("흠");

        let out = worker.call(&state, serde_json::Value::Null).await.unwrap();
        assert_eq!(out.patch.current_scenario_stage_id, Some("ask_name".to_string()));
    }

    #[tokio::test]
    async fn advances_once_required_field_is_filled() {
        let scenario = slot_filling_scenario();
        let worker = ScenarioEngineWorker::new(MockProvider::with_text("{}"), scenario);
        let mut state = ConversationState::new();
        state.current_scenario_stage_id = Some("ask_name".into());
        state.push_user_message("김민준입니다");
        state.collected_info.insert("name".into(), banking_types::CollectedValue::Text("김민준".into()));

        let out = worker.call(&state, serde_json::Value::Null).await.unwrap();
        assert_eq!(out.patch.current_scenario_stage_id, Some("done".to_string()));
        let reply: ScenarioEngineReply = serde_json::from_value(out.payload).unwrap();
        assert_eq!(reply.message.as_deref(), Some("감사합니다."));
    }

    fn _assert_message_field_exists() {
        let _ = Message::user("x");
    }
}
