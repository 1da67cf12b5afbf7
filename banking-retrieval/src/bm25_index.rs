//! BM25 half of hybrid retrieval (§4.5 step 2), built on the `bm25`
//! crate's sparse embedder/scorer pair.

use bm25::{Embedder, EmbedderBuilder, Language, Scorer};

/// A BM25 index over a fixed set of chunks, keyed by their position in
/// the caller's chunk list.
pub struct Bm25Index {
    embedder: Embedder,
    scorer: Scorer<usize>,
}

impl Bm25Index {
    /// Build an index over `chunks`, fitting the embedder's IDF table to
    /// this corpus.
    pub fn build(chunks: &[String]) -> Self {
        let embedder: Embedder = EmbedderBuilder::with_fit_to_corpus(Language::English, chunks).build();
        let mut scorer = Scorer::new();
        for (id, text) in chunks.iter().enumerate() {
            scorer.upsert(&id, embedder.embed(text));
        }
        Self { embedder, scorer }
    }

    /// Score every indexed chunk against `query`, returning `(id,
    /// score)` pairs sorted by descending score.
    pub fn search(&self, query: &str) -> Vec<(usize, f32)> {
        let query_embedding = self.embedder.embed(query);
        self.scorer
            .matches(&query_embedding)
            .into_iter()
            .map(|m| (*m.id, m.score))
            .collect()
    }
}
