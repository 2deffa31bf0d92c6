//! Corpus discovery: plain-text documents under a source directory.

use std::fs;
use std::path::Path;

use crate::error::IngestionError;

/// A loaded source document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the corpus root, used as chunk provenance.
    pub source: String,
    pub text: String,
}

/// Load every `.txt` document under `source_dir`, recursively, in path order.
///
/// Empty files are skipped with a warning.
///
/// # Errors
///
/// Returns [`IngestionError::MissingCorpus`] if the directory does not exist,
/// [`IngestionError::EmptyCorpus`] if no non-empty document is found, and IO
/// or glob errors if discovery or reading fails.
pub fn load_corpus(source_dir: &Path) -> Result<Vec<Document>, IngestionError> {
    if !source_dir.is_dir() {
        return Err(IngestionError::MissingCorpus(source_dir.to_path_buf()));
    }

    let pattern = source_dir.join("**").join("*.txt");
    let pattern = pattern.to_string_lossy();

    let mut paths: Vec<_> = glob::glob(&pattern)?.collect::<Result<_, _>>()?;
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(&path)?;
        let source = path
            .strip_prefix(source_dir)
            .unwrap_or(&path)
            .display()
            .to_string();
        if text.trim().is_empty() {
            tracing::warn!(source, "skipping empty document");
            continue;
        }
        documents.push(Document { source, text });
    }

    if documents.is_empty() {
        return Err(IngestionError::EmptyCorpus(source_dir.to_path_buf()));
    }

    Ok(documents)
}
