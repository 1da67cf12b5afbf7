//! Next-stage decision (§4.4): deterministic shortcut when a stage has
//! at most one transition, LLM arbitration among named candidates
//! otherwise, falling back to `default_next_stage_id`, or chain-through
//! for stages with no prompt of their own.

use banking_llm::{Provider, ProviderMessage, ProviderRequest};
use banking_types::{Scenario, Stage};
use serde::Deserialize;

/// Sentinel intent the driver recognizes as "resolve this stage without
/// waiting for user input" (§4.4 chain-through rule).
pub const AUTOMATIC_TRANSITION_INTENT: &str = "automatic_transition";
/// Sentinel utterance paired with [`AUTOMATIC_TRANSITION_INTENT`].
pub const NO_USER_INPUT_SENTINEL: &str = "<NO_USER_INPUT_PROCEED_AUTOMATICALLY>";

#[derive(Debug, Deserialize)]
struct TransitionChoice {
    next_stage_id: String,
}

fn build_transition_prompt(stage: &Stage, utterance: &str, intent: Option<&str>) -> String {
    let mut candidates = String::new();
    for (i, t) in stage.transitions.iter().enumerate() {
        candidates.push_str(&format!(
            "{}. {} (조건: {})\n",
            i + 1,
            t.next_stage_id,
            t.condition_description
        ));
        if !t.example_phrases.is_empty() {
            candidates.push_str(&format!("   예시: {}\n", t.example_phrases.join(", ")));
        }
    }
    format!(
        "현재 단계: {}\n\
         사용자 발화: \"{}\"\n\
         분류된 의도: {}\n\n\
         다음 후보 단계 중 사용자 발화에 가장 적합한 것을 고르세요:\n{}\n\
         JSON 형식으로만 답하세요: {{\"next_stage_id\": \"<선택한 단계 id>\"}}",
        stage.id,
        utterance,
        intent.unwrap_or("unknown"),
        candidates
    )
}

/// Decide the next stage id for `stage`, given the current turn's
/// utterance and classified intent. Never returns `None` for a
/// non-terminal stage with any transitions or a declared
/// `default_next_stage_id` — the engine always makes forward progress
/// or deliberately stays put.
pub async fn decide_next_stage<P: Provider>(
    provider: &P,
    stage: &Stage,
    utterance: &str,
    intent: Option<&str>,
) -> Option<String> {
    match stage.transitions.len() {
        0 => stage.default_next_stage_id.clone(),
        1 => Some(stage.transitions[0].next_stage_id.clone()),
        _ => {
            let prompt = build_transition_prompt(stage, utterance, intent);
            let request = ProviderRequest::json(vec![ProviderMessage::user(prompt)]);
            match provider.json_llm(request).await {
                Ok(resp) => match serde_json::from_str::<TransitionChoice>(&resp.text) {
                    Ok(choice)
                        if stage
                            .transitions
                            .iter()
                            .any(|t| t.next_stage_id == choice.next_stage_id) =>
                    {
                        Some(choice.next_stage_id)
                    }
                    _ => stage.default_next_stage_id.clone(),
                },
                Err(_) => stage.default_next_stage_id.clone(),
            }
        }
    }
}

/// Follow logic-only stages (no prompt of their own) until reaching one
/// that has a prompt, a terminal stage, or a stage the resolver could
/// not advance past. Bounded by `scenario.stages.len()` hops to never
/// loop forever on a malformed graph.
pub async fn chain_through<P: Provider>(
    provider: &P,
    scenario: &Scenario,
    mut stage_id: String,
) -> String {
    let bound = scenario.stages.len().max(1);
    for _ in 0..bound {
        let Some(stage) = scenario.stage(&stage_id) else {
            break;
        };
        if stage.prompt.is_some() || stage.kind.is_terminal() {
            break;
        }
        match decide_next_stage(provider, stage, NO_USER_INPUT_SENTINEL, Some(AUTOMATIC_TRANSITION_INTENT)).await {
            Some(next) if next != stage_id => stage_id = next,
            _ => break,
        }
    }
    stage_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_llm::MockProvider;
    use banking_types::{ResponseType, StageKind, Transition};
    use std::collections::HashMap;

    fn stage_with_transitions(transitions: Vec<Transition>, default: Option<&str>) -> Stage {
        Stage {
            id: "s".into(),
            kind: StageKind::Logic,
            prompt: None,
            response_type: ResponseType::Narrative,
            choices: Vec::new(),
            visible_groups: Vec::new(),
            transitions,
            default_next_stage_id: default.map(str::to_string),
            modifiable_fields: Vec::new(),
            completion_message: None,
        }
    }

    #[tokio::test]
    async fn single_transition_is_deterministic_no_llm_call() {
        let provider = MockProvider {
            response: std::sync::Mutex::new(None),
        };
        let stage = stage_with_transitions(
            vec![Transition {
                condition_description: "always".into(),
                next_stage_id: "next".into(),
                example_phrases: Vec::new(),
            }],
            None,
        );
        let next = decide_next_stage(&provider, &stage, "hello", None).await;
        assert_eq!(next, Some("next".to_string()));
    }

    #[tokio::test]
    async fn no_transitions_falls_back_to_default() {
        let provider = MockProvider {
            response: std::sync::Mutex::new(None),
        };
        let stage = stage_with_transitions(vec![], Some("fallback"));
        let next = decide_next_stage(&provider, &stage, "hello", None).await;
        assert_eq!(next, Some("fallback".to_string()));
    }

    #[tokio::test]
    async fn multiple_transitions_are_llm_arbitrated() {
        let provider = MockProvider::with_text(r#"{"next_stage_id": "b"}"#);
        let stage = stage_with_transitions(
            vec![
                Transition {
                    condition_description: "goes to a".into(),
                    next_stage_id: "a".into(),
                    example_phrases: Vec::new(),
                },
                Transition {
                    condition_description: "goes to b".into(),
                    next_stage_id: "b".into(),
                    example_phrases: Vec::new(),
                },
            ],
            Some("a"),
        );
        let next = decide_next_stage(&provider, &stage, "I want b", None).await;
        assert_eq!(next, Some("b".to_string()));
    }

    #[tokio::test]
    async fn invalid_llm_choice_falls_back_to_default() {
        let provider = MockProvider::with_text(r#"{"next_stage_id": "not_a_candidate"}"#);
        let stage = stage_with_transitions(
            vec![
                Transition {
                    condition_description: "a".into(),
                    next_stage_id: "a".into(),
                    example_phrases: Vec::new(),
                },
                Transition {
                    condition_description: "b".into(),
                    next_stage_id: "b".into(),
                    example_phrases: Vec::new(),
                },
            ],
            Some("a"),
        );
        let next = decide_next_stage(&provider, &stage, "?", None).await;
        assert_eq!(next, Some("a".to_string()));
    }

    #[tokio::test]
    async fn chain_through_stops_at_first_prompted_stage() {
        let provider = MockProvider {
            response: std::sync::Mutex::new(None),
        };
        let mut stages = HashMap::new();
        stages.insert(
            "logic1".to_string(),
            stage_with_transitions(
                vec![Transition {
                    condition_description: "always".into(),
                    next_stage_id: "prompted".into(),
                    example_phrases: Vec::new(),
                }],
                None,
            ),
        );
        let mut prompted = stage_with_transitions(vec![], None);
        prompted.id = "prompted".into();
        prompted.prompt = Some("질문입니다".into());
        stages.insert("prompted".to_string(), prompted);

        let scenario = Scenario {
            product_id: banking_types::ProductType::DepositAccount,
            initial_stage_id: "logic1".into(),
            stages,
            required_info_fields: Vec::new(),
            field_groups: Vec::new(),
            end_message: "done".into(),
            display_labels: HashMap::new(),
        };

        let result = chain_through(&provider, &scenario, "logic1".to_string()).await;
        assert_eq!(result, "prompted");
    }
}
