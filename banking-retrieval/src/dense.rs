//! Dense-vector half of hybrid retrieval (§4.5 step 2). The embedding
//! backend is a trait, parallel to `banking_llm::Provider`, so this
//! crate never hard-codes one; [`InMemoryCosineIndex`] is the default,
//! tested implementation — it reads a pre-embedded index, it does not
//! build one from raw documents beyond what its own tests embed.

use std::future::Future;

use thiserror::Error;

/// Errors from an embedding backend.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The backend call failed.
    #[error("embedding request failed: {0}")]
    RequestFailed(String),
}

/// Produces a dense embedding for a piece of text. Implemented by a
/// concrete embedding backend (out of scope here — "vector store opened
/// read-only" per §5); [`InMemoryCosineIndex`] only needs this to embed
/// a query against vectors it already holds.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `text` into a dense vector.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, EmbeddingError>> + Send;
}

/// One entry in an in-memory dense index.
#[derive(Debug, Clone)]
struct IndexedVector {
    id: usize,
    vector: Vec<f32>,
}

/// A minimal in-memory cosine-similarity index over pre-computed dense
/// vectors. Construction (embedding raw documents) is this struct's own
/// concern only in tests; in production the vectors are loaded
/// pre-embedded from wherever the offline ingestion pipeline wrote them
/// (out of scope, §5).
#[derive(Debug, Clone, Default)]
pub struct InMemoryCosineIndex {
    vectors: Vec<IndexedVector>,
}

impl InMemoryCosineIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pre-computed vector under `id` (typically a chunk index
    /// into the caller's chunk list).
    pub fn insert(&mut self, id: usize, vector: Vec<f32>) {
        self.vectors.push(IndexedVector { id, vector });
    }

    /// Score every indexed vector against `query` by cosine similarity,
    /// returning `(id, score)` pairs sorted by descending score.
    pub fn search(&self, query: &[f32]) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .map(|v| (v.id, cosine_similarity(query, &v.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let dot: f32 = a[..len].iter().zip(&b[..len]).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a[..len].iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b[..len].iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_highest() {
        let mut index = InMemoryCosineIndex::new();
        index.insert(0, vec![1.0, 0.0, 0.0]);
        index.insert(1, vec![0.0, 1.0, 0.0]);

        let results = index.search(&[1.0, 0.0, 0.0]);
        assert_eq!(results[0].0, 0);
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn zero_vector_scores_zero_not_nan() {
        let mut index = InMemoryCosineIndex::new();
        index.insert(0, vec![0.0, 0.0]);
        let results = index.search(&[1.0, 0.0]);
        assert_eq!(results[0].1, 0.0);
    }
}
