//! Loads a knowledge-base corpus directory (one markdown file per
//! product, §5 "QA worker corpus") into plain-text documents for
//! downstream chunking/retrieval.

use std::path::Path;
use std::sync::Arc;

use crate::error::ConfigError;

/// A single loaded markdown knowledge-base document.
#[derive(Debug, Clone)]
pub struct CorpusDocument {
    /// File stem, used as the product/topic identifier (e.g. `"jeonse"`).
    pub id: String,
    /// Raw markdown text.
    pub text: String,
}

/// Load every `.md` file directly under `dir` as a [`CorpusDocument`].
///
/// Returns [`ConfigError::CorpusEmpty`] if the directory contains no
/// markdown files — the QA worker has nothing to answer from and this
/// is treated as a startup misconfiguration, not a runtime condition.
pub fn load(dir: impl AsRef<Path>) -> Result<Arc<Vec<CorpusDocument>>, ConfigError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::Io {
        path: dir.display().to_string(),
        source: e.to_string(),
    })?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::Io {
            path: dir.display().to_string(),
            source: e.to_string(),
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }

        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        documents.push(CorpusDocument { id, text });
    }

    if documents.is_empty() {
        return Err(ConfigError::CorpusEmpty {
            path: dir.display().to_string(),
        });
    }

    documents.sort_by(|a, b| a.id.cmp(&b.id));
    tracing::info!(path = %dir.display(), documents = documents.len(), "loaded corpus");
    Ok(Arc::new(documents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_markdown_files_sorted_by_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("jeonse.md"), "전세자금대출 안내").unwrap();
        std::fs::write(dir.path().join("didimdol.md"), "디딤돌대출 안내").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let docs = load(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "didimdol");
        assert_eq!(docs[1].id, "jeonse");
    }

    #[test]
    fn empty_directory_is_corpus_empty_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(dir.path());
        assert!(matches!(result, Err(ConfigError::CorpusEmpty { .. })));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let result = load("/tmp/banking_config_nonexistent_corpus_dir_xyz");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
