//! Error types for sabio-index.

use std::path::PathBuf;

/// Errors that can occur while loading, chunking, and indexing a corpus.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    /// IO error reading source files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid glob pattern for corpus discovery.
    #[error("glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Glob iteration failed on a path.
    #[error("glob error: {0}")]
    Glob(#[from] glob::GlobError),

    /// Corpus directory does not exist.
    #[error("corpus directory not found: {0}")]
    MissingCorpus(PathBuf),

    /// Corpus directory contains no usable documents.
    #[error("no non-empty documents found in {0}")]
    EmptyCorpus(PathBuf),

    /// Embedding request failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] sabio_llm::LlmError),

    /// Vector store operation failed.
    #[error("vector store error: {0}")]
    Store(#[from] crate::vector_store::VectorStoreError),
}

/// Errors that can occur while answering a similarity query.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// Query embedding failed.
    #[error("query embedding failed: {0}")]
    Embedding(#[from] sabio_llm::LlmError),

    /// Vector store search failed.
    #[error("vector store error: {0}")]
    Store(#[from] crate::vector_store::VectorStoreError),
}
