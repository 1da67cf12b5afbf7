//! Response synthesizer (C9, §4.9): the six-step priority chain that
//! produces the single Korean reply sent to the user each turn.

use banking_llm::{Provider, ProviderMessage, ProviderRequest};
use banking_types::{ConversationState, TurnState};

const GENERIC_APOLOGY: &str = "죄송합니다. 다시 한 번 말씀해 주시겠어요?";

fn is_meaningful(text: Option<&str>) -> bool {
    text.is_some_and(|t| !t.trim().is_empty())
}

fn build_synthesis_prompt(factual_response: &str, stage_prompt: &str) -> String {
    format!(
        "답변: {factual_response}\n다음 안내: {stage_prompt}\n\n\
         위 답변과 다음 안내를 하나의 자연스러운 한국어 문장으로 합쳐서, \
         먼저 질문에 답하고 이어서 시나리오를 계속 진행하도록 작성하세요."
    )
}

/// Produce this turn's final reply text, following the six-step
/// priority chain (§4.9). `stage_prompt` is the already-interpolated
/// C7 output for the current stage, if the scenario has one to show.
pub async fn synthesize<P: Provider>(provider: &P, turn: &TurnState, stage_prompt: Option<&str>) -> String {
    // 1. A worker (e.g. the correction agent) already produced the reply.
    if let Some(text) = &turn.final_response_text {
        return text.clone();
    }

    // 2. The router answered directly (chit-chat, clarification, ...).
    if let Some(text) = &turn.router_direct_response {
        return text.clone();
    }

    let factual = turn.factual_response.as_deref();
    let meaningful_stage_prompt = is_meaningful(stage_prompt);

    // 3. Both a factual answer and a real continuation exist: merge them.
    if let (Some(factual), true) = (factual, meaningful_stage_prompt) {
        let stage_prompt = stage_prompt.unwrap_or_default();
        let prompt = build_synthesis_prompt(factual, stage_prompt);
        let request = ProviderRequest::text(vec![ProviderMessage::user(prompt)]).with_temperature(0.3);
        return match provider.generative_llm(request).await {
            Ok(resp) => resp.text,
            Err(err) => {
                tracing::warn!(error = %err, "synthesis LLM call failed, concatenating deterministically");
                format!("{factual}\n\n{stage_prompt}")
            }
        };
    }

    // 4. Only the factual answer exists.
    if let Some(factual) = factual {
        return factual.to_string();
    }

    // 5. Only the stage prompt exists.
    if meaningful_stage_prompt {
        return stage_prompt.unwrap_or_default().to_string();
    }

    // 6. Nothing usable was produced this turn.
    GENERIC_APOLOGY.to_string()
}

/// Append `reply` as the assistant's turn and mark the turn settled
/// (§4.9: "Append the chosen reply to `messages`... set
/// `is_final_turn_response := true`").
pub fn finalize(state: &mut ConversationState, turn: &mut TurnState, reply: String) {
    state.push_assistant_message(reply.clone());
    turn.final_response_text = Some(reply);
    turn.is_final_turn_response = true;
}
