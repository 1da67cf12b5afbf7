//! The retrieval QA worker itself (§4.5), composing query expansion,
//! hybrid retrieval, and answer synthesis behind [`WorkerDyn`].
//!
//! Registered as `"qa_agent"`. Never returns `Err` for a knowledge-base
//! failure — both failure modes named in §4.5/§7 degrade to a Korean
//! apology string carried as the `factual_response` payload field, the
//! same field the response synthesizer (`banking-present::synth`)
//! reads from `TurnState`.

use std::sync::Arc;

use async_trait::async_trait;
use banking_llm::Provider;
use banking_types::ConversationState;
use serde::Deserialize;
use serde_json::json;

use crate::bm25_index::Bm25Index;
use crate::chunker::Chunk;
use crate::dense::{EmbeddingProvider, InMemoryCosineIndex};
use crate::error::RetrievalError;
use crate::expansion;
use crate::hybrid;
use crate::synthesis;
use banking_worker::{WorkerDyn, WorkerError, WorkerOutput};

const CORPUS_NOT_READY_MESSAGE: &str =
    "죄송합니다. 현재 해당 정보를 확인할 수 없습니다. 잠시 후 다시 시도해 주세요.";
const RETRIEVAL_ERROR_MESSAGE: &str = "정보를 검색하는 중 오류가 발생했습니다.";

#[derive(Debug, Deserialize)]
struct RetrievalInput {
    question: String,
}

/// Retrieval QA worker over one product's knowledge-base corpus.
///
/// `dense` is a pre-embedded [`InMemoryCosineIndex`] over `chunks` —
/// construction of that index (embedding the corpus offline) is out of
/// scope for this worker; only the BM25 side is fit here, at
/// construction time, from the same chunk set.
pub struct RetrievalWorker<P: Provider, E: EmbeddingProvider> {
    provider: P,
    embedder: E,
    product_name: String,
    chunks: Vec<Chunk>,
    bm25: Bm25Index,
    dense: InMemoryCosineIndex,
}

impl<P: Provider, E: EmbeddingProvider> RetrievalWorker<P, E> {
    /// Build a worker over `chunks`, fitting a BM25 index over their
    /// text. `dense` must already hold one vector per entry of `chunks`,
    /// keyed by index into `chunks`.
    pub fn new(provider: P, embedder: E, product_name: impl Into<String>, chunks: Vec<Chunk>, dense: InMemoryCosineIndex) -> Self {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let bm25 = Bm25Index::build(&texts);
        Self {
            provider,
            embedder,
            product_name: product_name.into(),
            chunks,
            bm25,
            dense,
        }
    }

    async fn answer(&self, question: &str, history_snippet: &str) -> Result<String, RetrievalError> {
        if self.chunks.is_empty() {
            return Err(RetrievalError::CorpusNotReady);
        }

        let queries = expansion::expand(&self.provider, question, &self.product_name, history_snippet).await;

        let mut per_query = Vec::with_capacity(queries.len());
        for query in &queries {
            match self.embedder.embed(query).await {
                Ok(vector) => per_query.push((query.clone(), vector)),
                Err(err) => tracing::warn!(%query, error = %err, "query embedding failed, skipping expansion"),
            }
        }
        if per_query.is_empty() {
            return Err(RetrievalError::RetrievalException("no query could be embedded".into()));
        }

        let retrieved = hybrid::retrieve_all(&self.chunks, &self.bm25, &self.dense, &per_query);

        synthesis::synthesize(&self.provider, question, &retrieved)
            .await
            .ok_or_else(|| RetrievalError::RetrievalException("answer synthesis failed".into()))
    }
}

#[async_trait]
impl<P: Provider, E: EmbeddingProvider> WorkerDyn for RetrievalWorker<P, E> {
    fn name(&self) -> &str {
        "qa_agent"
    }

    fn description(&self) -> &str {
        "Retrieval-augmented QA over the product knowledge-base corpus"
    }

    async fn call(&self, state: &ConversationState, input: serde_json::Value) -> Result<WorkerOutput, WorkerError> {
        let input: RetrievalInput = serde_json::from_value(input)
            .map_err(|e| WorkerError::InvalidInput(format!("qa_agent expects {{question}}: {e}")))?;

        let history_snippet = state
            .recent_history(3)
            .iter()
            .map(|m| format!("{:?}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let answer = match self.answer(&input.question, &history_snippet).await {
            Ok(text) => text,
            Err(RetrievalError::CorpusNotReady) => {
                tracing::warn!(product = %self.product_name, "qa_agent: corpus not ready");
                CORPUS_NOT_READY_MESSAGE.to_string()
            }
            Err(RetrievalError::RetrievalException(reason)) => {
                tracing::warn!(product = %self.product_name, %reason, "qa_agent: retrieval failed");
                RETRIEVAL_ERROR_MESSAGE.to_string()
            }
        };

        Ok(WorkerOutput {
            patch: Default::default(),
            payload: json!({ "factual_response": answer }),
        })
    }
}

/// Wrap a [`RetrievalWorker`] for registration in a [`banking_worker::WorkerRegistry`].
pub fn into_registry_entry<P, E>(worker: RetrievalWorker<P, E>) -> Arc<dyn WorkerDyn>
where
    P: Provider + 'static,
    E: EmbeddingProvider + 'static,
{
    Arc::new(worker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use banking_llm::MockProvider;
    use std::future::Future;

    struct StubEmbedder;

    impl EmbeddingProvider for StubEmbedder {
        fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, crate::dense::EmbeddingError>> + Send {
            let v = if text.contains('디') { vec![1.0, 0.0] } else { vec![0.0, 1.0] };
            async move { Ok(v) }
        }
    }

    fn sample_chunks() -> Vec<Chunk> {
        vec![Chunk {
            source_id: "didimdol".into(),
            text: "디딤돌대출 금리는 연 2.5퍼센트입니다".into(),
        }]
    }

    #[tokio::test]
    async fn empty_corpus_degrades_to_apology_without_erroring() {
        let provider = MockProvider::with_text("");
        let worker = RetrievalWorker::new(provider, StubEmbedder, "디딤돌", vec![], InMemoryCosineIndex::new());
        let state = ConversationState::new();
        let out = worker
            .call(&state, json!({"question": "금리가 얼마인가요?"}))
            .await
            .unwrap();
        assert_eq!(out.payload["factual_response"], json!(CORPUS_NOT_READY_MESSAGE));
    }

    #[tokio::test]
    async fn answers_from_corpus_when_synthesis_succeeds() {
        let provider = MockProvider::with_text("디딤돌대출 금리는 연 2.5퍼센트입니다.");
        let mut dense = InMemoryCosineIndex::new();
        dense.insert(0, vec![1.0, 0.0]);
        let worker = RetrievalWorker::new(provider, StubEmbedder, "디딤돌", sample_chunks(), dense);
        let state = ConversationState::new();
        let out = worker
            .call(&state, json!({"question": "금리가 얼마인가요?"}))
            .await
            .unwrap();
        assert_eq!(
            out.payload["factual_response"],
            json!("디딤돌대출 금리는 연 2.5퍼센트입니다.")
        );
    }

    #[tokio::test]
    async fn invalid_input_shape_is_rejected() {
        let provider = MockProvider::with_text("x");
        let worker = RetrievalWorker::new(provider, StubEmbedder, "디딤돌", sample_chunks(), InMemoryCosineIndex::new());
        let state = ConversationState::new();
        let result = worker.call(&state, json!({"wrong_key": "x"})).await;
        assert!(matches!(result, Err(WorkerError::InvalidInput(_))));
    }
}
