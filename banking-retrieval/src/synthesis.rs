//! Answer synthesis (§4.5 step 3): concatenate retrieved chunks (tagged
//! with source) and the original question into a single prompt; the
//! answer must read as a direct statement, never a citation
//! ("제공된 정보에 따르면" and similar phrasing is explicitly banned by
//! the prompt).

use banking_llm::{Provider, ProviderMessage, ProviderRequest};

use crate::chunker::Chunk;

fn build_prompt(question: &str, chunks: &[&Chunk]) -> String {
    let mut context = String::new();
    for chunk in chunks {
        context.push_str(&format!("[{}]\n{}\n\n", chunk.source_id, chunk.text));
    }
    format!(
        "다음은 참고 자료입니다:\n{}\n\
         사용자 질문: \"{}\"\n\n\
         위 자료를 바탕으로 질문에 직접 답하세요. \"제공된 정보에 따르면\", \"자료에 의하면\" 같은 \
         출처 언급이나 메타 설명 없이, 자연스러운 한국어 문장으로만 답하세요.",
        context, question
    )
}

/// Synthesize a single Korean answer from the retrieved chunks. Returns
/// `None` on a provider failure — the caller degrades to the generic
/// error string (§4.5 failure semantics).
pub async fn synthesize<P: Provider>(provider: &P, question: &str, chunks: &[&Chunk]) -> Option<String> {
    let prompt = build_prompt(question, chunks);
    let request = ProviderRequest::text(vec![ProviderMessage::user(prompt)]).with_temperature(0.3);
    provider.generative_llm(request).await.ok().map(|r| r.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_llm::MockProvider;

    #[tokio::test]
    async fn synthesizes_answer_from_chunks() {
        let provider = MockProvider::with_text("디딤돌대출 금리는 연 2.5퍼센트입니다.");
        let chunk = Chunk {
            source_id: "didimdol".into(),
            text: "디딤돌대출 금리는 연 2.5퍼센트".into(),
        };
        let answer = synthesize(&provider, "금리가 얼마인가요?", &[&chunk]).await;
        assert_eq!(answer.as_deref(), Some("디딤돌대출 금리는 연 2.5퍼센트입니다."));
    }

    #[tokio::test]
    async fn provider_failure_yields_none() {
        let provider = MockProvider {
            response: std::sync::Mutex::new(None),
        };
        let answer = synthesize(&provider, "질문", &[]).await;
        assert_eq!(answer, None);
    }
}
