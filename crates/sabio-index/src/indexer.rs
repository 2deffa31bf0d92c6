//! Corpus indexing orchestrator: load → chunk → embed → store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use crate::chunker::{Chunk, ChunkerConfig, chunk_document};
use crate::error::IngestionError;
use crate::loader::load_corpus;
use crate::vector_store::{VectorPoint, VectorStore};
use sabio_llm::provider::LlmProvider;

/// Collection holding every embedded corpus chunk.
pub const CHUNK_COLLECTION: &str = "corpus_chunks";

/// Summary of an ingestion run.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub documents_loaded: usize,
    pub chunks_indexed: usize,
    pub duration_ms: u64,
}

/// Orchestrates corpus ingestion into a vector store.
pub struct CorpusIndexer<P, V> {
    store: Arc<V>,
    provider: Arc<P>,
    config: ChunkerConfig,
}

impl<P: LlmProvider, V: VectorStore> CorpusIndexer<P, V> {
    #[must_use]
    pub fn new(store: Arc<V>, provider: Arc<P>, config: ChunkerConfig) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    /// Ingest every document under `source_dir`.
    ///
    /// Point ids derive from source, position, and content, so re-ingesting
    /// an unchanged corpus overwrites the same points instead of duplicating
    /// them.
    ///
    /// # Errors
    ///
    /// Returns an error if the corpus is missing or empty, or if embedding or
    /// storage fails. Ingestion is all-or-nothing per run: the first failure
    /// aborts it.
    pub async fn build(&self, source_dir: &Path) -> Result<IndexReport, IngestionError> {
        let start = std::time::Instant::now();
        let mut report = IndexReport::default();

        let documents = load_corpus(source_dir)?;
        report.documents_loaded = documents.len();

        let probe = self.provider.embed("probe").await?;
        let vector_size = u64::try_from(probe.len()).unwrap_or(u64::MAX);
        self.store
            .ensure_collection(CHUNK_COLLECTION, vector_size)
            .await?;

        let total = documents.len();
        tracing::info!(total, source = %source_dir.display(), "ingestion started");

        for (i, doc) in documents.iter().enumerate() {
            let chunks = chunk_document(&doc.text, &doc.source, &self.config);
            let mut points = Vec::with_capacity(chunks.len());
            for chunk in &chunks {
                let vector = self.provider.embed(&chunk.text).await?;
                points.push(chunk_point(chunk, vector));
            }
            let created = points.len();
            self.store.upsert(CHUNK_COLLECTION, points).await?;
            report.chunks_indexed += created;
            tracing::info!(
                source = %doc.source,
                progress = format_args!("{}/{total}", i + 1),
                chunks = created,
            );
        }

        self.store.flush(CHUNK_COLLECTION).await?;

        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        tracing::info!(
            documents = report.documents_loaded,
            chunks = report.chunks_indexed,
            duration_ms = report.duration_ms,
            "ingestion finished"
        );
        Ok(report)
    }
}

fn chunk_point(chunk: &Chunk, vector: Vec<f32>) -> VectorPoint {
    let id = Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("{}:{}:{}", chunk.source, chunk.index, chunk.content_hash).as_bytes(),
    )
    .to_string();

    let payload = HashMap::from([
        (
            "text".to_owned(),
            serde_json::Value::String(chunk.text.clone()),
        ),
        (
            "source".to_owned(),
            serde_json::Value::String(chunk.source.clone()),
        ),
        (
            "chunk_index".to_owned(),
            serde_json::Value::from(chunk.index),
        ),
    ]);

    VectorPoint {
        id,
        vector,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory_store::InMemoryVectorStore;
    use sabio_llm::mock::MockProvider;

    fn indexer(
        store: &Arc<InMemoryVectorStore>,
    ) -> CorpusIndexer<MockProvider, InMemoryVectorStore> {
        CorpusIndexer::new(
            Arc::clone(store),
            Arc::new(MockProvider::default()),
            ChunkerConfig::default(),
        )
    }

    #[tokio::test]
    async fn build_indexes_all_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Garantía de dos años.").unwrap();
        std::fs::write(dir.path().join("b.txt"), "Envíos en 24 horas.").unwrap();

        let store = Arc::new(InMemoryVectorStore::new());
        let report = indexer(&store).build(dir.path()).await.unwrap();

        assert_eq!(report.documents_loaded, 2);
        assert_eq!(report.chunks_indexed, 2);
        assert_eq!(store.len(CHUNK_COLLECTION).unwrap(), 2);
    }

    #[tokio::test]
    async fn rebuilding_unchanged_corpus_does_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Garantía de dos años.").unwrap();

        let store = Arc::new(InMemoryVectorStore::new());
        indexer(&store).build(dir.path()).await.unwrap();
        let before = store.len(CHUNK_COLLECTION).unwrap();
        indexer(&store).build(dir.path()).await.unwrap();
        assert_eq!(store.len(CHUNK_COLLECTION).unwrap(), before);
    }

    #[tokio::test]
    async fn missing_corpus_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryVectorStore::new());
        let err = indexer(&store)
            .build(&dir.path().join("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::MissingCorpus(_)));
    }

    #[tokio::test]
    async fn embedding_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "contenido").unwrap();

        let store = Arc::new(InMemoryVectorStore::new());
        let provider = MockProvider {
            fail_embed: true,
            ..MockProvider::default()
        };
        let indexer = CorpusIndexer::new(
            Arc::clone(&store),
            Arc::new(provider),
            ChunkerConfig::default(),
        );
        let err = indexer.build(dir.path()).await.unwrap_err();
        assert!(matches!(err, IngestionError::Embedding(_)));
    }
}
