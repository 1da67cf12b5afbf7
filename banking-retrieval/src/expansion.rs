//! Query expansion (§4.5 step 1): ask an LLM for paraphrases/sub-queries
//! of the user's question, degrading to the original question alone on
//! any failure.

use banking_llm::{Provider, ProviderMessage, ProviderRequest};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ExpansionResponse {
    queries: Vec<String>,
}

fn build_prompt(question: &str, product_name: &str, history_snippet: &str) -> String {
    format!(
        "상품: {}\n최근 대화:\n{}\n\n사용자 질문: \"{}\"\n\n\
         이 질문에 대한 답을 찾기 위한 2~3개의 재진술/세부 질의를 JSON으로 생성하세요.\n\
         형식: {{\"queries\": [\"...\", \"...\"]}}",
        product_name, history_snippet, question
    )
}

/// Produce query expansions for `question`, falling back to
/// `[question]` on any provider or parse error.
pub async fn expand<P: Provider>(
    provider: &P,
    question: &str,
    product_name: &str,
    history_snippet: &str,
) -> Vec<String> {
    let prompt = build_prompt(question, product_name, history_snippet);
    let request = ProviderRequest::json(vec![ProviderMessage::user(prompt)]);

    match provider.json_llm(request).await {
        Ok(resp) => match serde_json::from_str::<ExpansionResponse>(&resp.text) {
            Ok(parsed) if !parsed.queries.is_empty() => parsed.queries,
            _ => vec![question.to_string()],
        },
        Err(_) => vec![question.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_llm::MockProvider;

    #[tokio::test]
    async fn valid_json_is_parsed_into_expansions() {
        let provider = MockProvider::with_text(r#"{"queries": ["금리가 얼마인가요", "디딤돌대출 이자율"]}"#);
        let queries = expand(&provider, "금리가 얼마인가요?", "디딤돌", "").await;
        assert_eq!(queries.len(), 2);
    }

    #[tokio::test]
    async fn provider_error_degrades_to_original_question() {
        let provider = MockProvider {
            response: std::sync::Mutex::new(Some(Err("timeout".into()))),
        };
        let queries = expand(&provider, "금리가 얼마인가요?", "디딤돌", "").await;
        assert_eq!(queries, vec!["금리가 얼마인가요?".to_string()]);
    }

    #[tokio::test]
    async fn malformed_json_degrades_to_original_question() {
        let provider = MockProvider::with_text("not json");
        let queries = expand(&provider, "질문", "디딤돌", "").await;
        assert_eq!(queries, vec!["질문".to_string()]);
    }
}
