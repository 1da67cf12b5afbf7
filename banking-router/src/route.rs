//! Router entry point (§4.6): classify the turn and emit an ordered
//! action plan. The router never executes workers — the driver
//! dispatches whatever it returns.

use banking_llm::{Provider, ProviderMessage, ProviderRequest};
use banking_types::{ConversationState, PlanItem, ProductType, Stage};

use crate::product::ProductDescriptor;
use crate::prompt::{build_business_guidance_prompt, build_task_management_prompt, format_history, truncate_manual};
use crate::response::{fallback_plan, parse_guidance_response, parse_task_plan};

/// Classify `utterance` against `state` and produce the ordered plan
/// the driver should dispatch this turn.
///
/// Picks the business-guidance variant when no product has been chosen
/// yet, the task-management variant otherwise.
pub async fn route<P: Provider>(
    provider: &P,
    utterance: &str,
    state: &ConversationState,
    stage: Option<&Stage>,
    products: &[ProductDescriptor],
    full_manual: &str,
) -> Vec<PlanItem> {
    let history = format_history(state);
    let known_products: Vec<ProductType> = products.iter().map(|p| p.product_type).collect();

    if state.current_product_type.is_none() {
        let prompt = build_business_guidance_prompt(utterance, &history, products);
        return run_and_parse(provider, prompt, |raw| parse_guidance_response(raw, &known_products)).await;
    }

    let collected_info_json = serde_json::to_string(&state.collected_info).unwrap_or_default();
    let manual_excerpt = truncate_manual(full_manual);
    let prompt = build_task_management_prompt(utterance, &history, stage, &collected_info_json, &manual_excerpt);
    run_and_parse(provider, prompt, |raw| parse_task_plan(raw, &known_products)).await
}

async fn run_and_parse<P: Provider>(
    provider: &P,
    prompt: String,
    parse: impl FnOnce(&str) -> Option<Vec<PlanItem>>,
) -> Vec<PlanItem> {
    let request = ProviderRequest::json(vec![ProviderMessage::user(prompt)]);
    match provider.json_llm(request).await {
        Ok(resp) => parse(&resp.text).unwrap_or_else(|| {
            tracing::warn!(response = %resp.text, "router response failed schema validation");
            fallback_plan()
        }),
        Err(err) => {
            tracing::warn!(error = %err, "router provider call failed");
            fallback_plan()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_llm::MockProvider;

    fn products() -> Vec<ProductDescriptor> {
        vec![ProductDescriptor {
            product_type: ProductType::Didimdol,
            description: "주택 구입 자금 대출".into(),
        }]
    }

    #[tokio::test]
    async fn business_guidance_runs_when_no_product_selected() {
        let provider = MockProvider::with_text(r#"{"action": "proceed_with_product_type_didimdol"}"#);
        let state = ConversationState::new();
        let plan = route(&provider, "디딤돌 대출 알아보고 싶어요", &state, None, &products(), "").await;
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].tool, "set_product_type");
    }

    #[tokio::test]
    async fn task_management_runs_once_product_is_selected() {
        let provider = MockProvider::with_text(r#"{"action_plan": [{"tool": "invoke_scenario_agent"}]}"#);
        let mut state = ConversationState::new();
        state.current_product_type = Some(ProductType::Didimdol);
        let plan = route(&provider, "네 맞아요", &state, None, &products(), "상품 매뉴얼...").await;
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].tool, "invoke_scenario_agent");
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_fallback_plan() {
        let provider = MockProvider {
            response: std::sync::Mutex::new(Some(Err("timeout".into()))),
        };
        let state = ConversationState::new();
        let plan = route(&provider, "안녕", &state, None, &products(), "").await;
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].tool, "answer_directly_chit_chat");
    }

    #[tokio::test]
    async fn invalid_json_degrades_to_fallback_plan() {
        let provider = MockProvider::with_text("not json");
        let mut state = ConversationState::new();
        state.current_product_type = Some(ProductType::Didimdol);
        let plan = route(&provider, "아무말", &state, None, &products(), "").await;
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].tool, "answer_directly_chit_chat");
        assert_eq!(
            plan[0].tool_input["direct_response"],
            crate::response::FALLBACK_APOLOGY
        );
    }
}
