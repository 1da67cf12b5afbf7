//! Recursive-character splitter (§4.5 step 2): splits each corpus
//! document into ~1000-character chunks with ~150-character overlap,
//! preferring to break at paragraph, then line, then sentence
//! boundaries before falling back to a hard character cut.

use banking_config::CorpusDocument;

/// Default target chunk size in characters.
pub const CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive chunks, in characters.
pub const CHUNK_OVERLAP: usize = 150;

const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];

/// One chunk of a source document, tagged with the document it came
/// from so answer synthesis can cite a source path.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// The `CorpusDocument::id` this chunk was cut from.
    pub source_id: String,
    /// The chunk's text.
    pub text: String,
}

/// Split `text` into chunks of at most `chunk_size` characters each,
/// with `overlap` characters of repeated context between consecutive
/// chunks, recursing through `SEPARATORS` to prefer natural breaks.
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let pieces = recursive_split(text, chunk_size, 0);
    merge_with_overlap(&pieces, chunk_size, overlap)
}

fn recursive_split(text: &str, chunk_size: usize, separator_idx: usize) -> Vec<String> {
    if text.chars().count() <= chunk_size {
        return vec![text.to_string()];
    }

    let Some(sep) = SEPARATORS.get(separator_idx) else {
        return hard_split(text, chunk_size);
    };

    let parts: Vec<&str> = text.split(sep.as_ref() as &str).collect();
    if parts.len() <= 1 {
        return recursive_split(text, chunk_size, separator_idx + 1);
    }

    let mut out = Vec::new();
    for part in parts {
        if part.is_empty() {
            continue;
        }
        if part.chars().count() > chunk_size {
            out.extend(recursive_split(part, chunk_size, separator_idx + 1));
        } else {
            out.push(part.to_string());
        }
    }
    out
}

fn hard_split(text: &str, chunk_size: usize) -> Vec<String> {
    text.chars()
        .collect::<Vec<char>>()
        .chunks(chunk_size)
        .map(|c| c.iter().collect())
        .collect()
}

fn merge_with_overlap(pieces: &[String], chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in pieces {
        if !current.is_empty() && current.chars().count() + piece.chars().count() > chunk_size {
            chunks.push(current.clone());
            let tail: String = current
                .chars()
                .rev()
                .take(overlap)
                .collect::<Vec<char>>()
                .into_iter()
                .rev()
                .collect();
            current = tail;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(piece);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Chunk every document in `docs` with the default size/overlap.
pub fn chunk_corpus(docs: &[CorpusDocument]) -> Vec<Chunk> {
    docs.iter()
        .flat_map(|doc| {
            split(&doc.text, CHUNK_SIZE, CHUNK_OVERLAP)
                .into_iter()
                .map(move |text| Chunk {
                    source_id: doc.id.clone(),
                    text,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split("short document", 1000, 150);
        assert_eq!(chunks, vec!["short document".to_string()]);
    }

    #[test]
    fn long_text_is_split_into_multiple_chunks() {
        let paragraph = "가".repeat(600);
        let text = format!("{}\n\n{}\n\n{}", paragraph, paragraph, paragraph);
        let chunks = split(&text, 1000, 150);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 1000 + 150));
    }

    #[test]
    fn chunk_corpus_tags_each_chunk_with_its_source() {
        let docs = vec![
            CorpusDocument {
                id: "jeonse".into(),
                text: "전세자금대출 안내".into(),
            },
            CorpusDocument {
                id: "didimdol".into(),
                text: "디딤돌대출 안내".into(),
            },
        ];
        let chunks = chunk_corpus(&docs);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().any(|c| c.source_id == "jeonse"));
        assert!(chunks.iter().any(|c| c.source_id == "didimdol"));
    }
}
