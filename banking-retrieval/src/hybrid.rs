//! Hybrid retrieval (§4.5 step 2): a weighted ensemble of the BM25 and
//! dense-vector retrievers (weights 0.4/0.6), run once per query
//! expansion and deduplicated by chunk content across expansions.

use std::collections::HashMap;

use crate::bm25_index::Bm25Index;
use crate::chunker::Chunk;
use crate::dense::InMemoryCosineIndex;

/// BM25 contribution to the combined score.
pub const BM25_WEIGHT: f32 = 0.4;
/// Dense-vector contribution to the combined score.
pub const DENSE_WEIGHT: f32 = 0.6;

/// How many chunks each single query expansion contributes before
/// cross-expansion deduplication.
const TOP_K_PER_QUERY: usize = 5;

fn min_max_normalize(scores: &[(usize, f32)]) -> HashMap<usize, f32> {
    let Some(max) = scores.iter().map(|(_, s)| *s).fold(None, |acc, s| match acc {
        None => Some(s),
        Some(m) if s > m => Some(s),
        acc => acc,
    }) else {
        return HashMap::new();
    };
    let min = scores
        .iter()
        .map(|(_, s)| *s)
        .fold(max, |acc, s| if s < acc { s } else { acc });
    let range = (max - min).max(f32::EPSILON);
    scores.iter().map(|(id, s)| (*id, (s - min) / range)).collect()
}

/// Retrieve the top chunks for one query expansion, combining
/// normalized BM25 and dense scores at the declared weights.
pub fn retrieve_one(bm25: &Bm25Index, dense: &InMemoryCosineIndex, dense_query: &[f32], query: &str) -> Vec<usize> {
    let bm25_scores = min_max_normalize(&bm25.search(query));
    let dense_scores = min_max_normalize(&dense.search(dense_query));

    let mut ids: Vec<usize> = bm25_scores.keys().chain(dense_scores.keys()).copied().collect();
    ids.sort_unstable();
    ids.dedup();

    let mut combined: Vec<(usize, f32)> = ids
        .into_iter()
        .map(|id| {
            let score = BM25_WEIGHT * bm25_scores.get(&id).copied().unwrap_or(0.0)
                + DENSE_WEIGHT * dense_scores.get(&id).copied().unwrap_or(0.0);
            (id, score)
        })
        .collect();
    combined.sort_by(|a, b| b.1.total_cmp(&a.1));
    combined.into_iter().take(TOP_K_PER_QUERY).map(|(id, _)| id).collect()
}

/// Run `retrieve_one` for every expansion and merge the results,
/// deduplicating by chunk *content* (not just id, since different
/// expansions may surface the same chunk) while preserving the order
/// the first occurrence was found in.
pub fn retrieve_all<'a>(
    chunks: &'a [Chunk],
    bm25: &Bm25Index,
    dense: &InMemoryCosineIndex,
    per_query: &[(String, Vec<f32>)],
) -> Vec<&'a Chunk> {
    let mut seen_text = std::collections::HashSet::new();
    let mut out = Vec::new();
    for (query, dense_query) in per_query {
        for id in retrieve_one(bm25, dense, dense_query, query) {
            let Some(chunk) = chunks.get(id) else { continue };
            if seen_text.insert(chunk.text.clone()) {
                out.push(chunk);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks() -> Vec<Chunk> {
        vec![
            Chunk {
                source_id: "didimdol".into(),
                text: "디딤돌대출 금리는 연 2.5퍼센트입니다".into(),
            },
            Chunk {
                source_id: "card".into(),
                text: "체크카드 발급 절차 안내".into(),
            },
        ]
    }

    #[test]
    fn dedups_chunk_surfaced_by_multiple_expansions() {
        let chunks = chunks();
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let bm25 = Bm25Index::build(&texts);
        let mut dense = InMemoryCosineIndex::new();
        dense.insert(0, vec![1.0, 0.0]);
        dense.insert(1, vec![0.0, 1.0]);

        let per_query = vec![
            ("디딤돌 금리".to_string(), vec![1.0, 0.0]),
            ("디딤돌 이자율".to_string(), vec![1.0, 0.0]),
        ];
        let results = retrieve_all(&chunks, &bm25, &dense, &per_query);
        let didimdol_count = results.iter().filter(|c| c.source_id == "didimdol").count();
        assert_eq!(didimdol_count, 1);
    }
}
