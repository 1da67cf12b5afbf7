//! Prompt construction for the two router variants (§4.6).

use banking_types::{ConversationState, ProductType, Stage};

use crate::product::ProductDescriptor;

/// Last ~5 exchanges, formatted `"user: ...\nassistant: ..."`, the shape
/// both prompt variants expect.
pub(crate) fn format_history(state: &ConversationState) -> String {
    banking_context::format_history(&state.recent_history(5))
}

pub(crate) fn build_business_guidance_prompt(utterance: &str, history: &str, products: &[ProductDescriptor]) -> String {
    let menu = products
        .iter()
        .map(|p| format!("- proceed_with_product_type_{}: {}", p.product_type.as_str(), p.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "최근 대화:\n{history}\n\n사용자 발화: \"{utterance}\"\n\n\
         아직 상품이 선택되지 않았습니다. 다음 중 하나로 분류하세요:\n{menu}\n\
         - invoke_qa_agent_general: 특정 상품과 무관한 일반 질문\n\
         - answer_directly_chit_chat: 잡담, 인사 등 업무와 무관한 발화\n\
         - clarify_product_type: 어떤 상품을 원하는지 불분명함\n\n\
         JSON으로만 답하세요: {{\"action\": \"...\", \"direct_response\": \"...\"}} (direct_response는 \
         answer_directly_chit_chat 또는 clarify_product_type일 때만 포함)."
    )
}

pub(crate) fn build_task_management_prompt(
    utterance: &str,
    history: &str,
    stage: Option<&Stage>,
    collected_info_json: &str,
    manual_excerpt: &str,
) -> String {
    let stage_prompt = stage.and_then(|s| s.prompt.as_deref()).unwrap_or("(없음)");
    let choices = stage
        .map(|s| {
            s.choices
                .iter()
                .map(|c| c.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    format!(
        "현재 단계 안내: {stage_prompt}\n유효한 선택지: {choices}\n\
         수집된 정보: {collected_info_json}\n\n최근 대화:\n{history}\n\n\
         상품 매뉴얼 발췌:\n{manual_excerpt}\n\n사용자 발화: \"{utterance}\"\n\n\
         다음 도구 중에서 순서가 있는 실행 계획을 JSON으로 생성하세요: select_product_type, \
         set_product_type_<product>, invoke_scenario_agent, invoke_qa_agent, invoke_web_search, \
         answer_directly_chit_chat, personal_info_correction, end_conversation, unclear_input.\n\
         형식: {{\"action_plan\": [{{\"tool\": \"...\", \"tool_input\": {{}}, \"direct_response\": \"...\"}}]}}"
    )
}

pub(crate) fn truncate_manual(full_manual: &str) -> String {
    full_manual.chars().take(2000).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_is_truncated_to_2000_characters() {
        let manual = "가".repeat(5000);
        let truncated = truncate_manual(&manual);
        assert_eq!(truncated.chars().count(), 2000);
    }

    #[test]
    fn guidance_prompt_lists_every_product() {
        let products = vec![ProductDescriptor {
            product_type: ProductType::Didimdol,
            description: "주택 구입 자금 대출".into(),
        }];
        let prompt = build_business_guidance_prompt("대출 알아보고 싶어요", "", &products);
        assert!(prompt.contains("proceed_with_product_type_didimdol"));
    }
}
