//! Semantic retrieval: embed the query, rank chunks by cosine similarity.

use std::sync::Arc;

use crate::error::RetrievalError;
use crate::indexer::CHUNK_COLLECTION;
use crate::vector_store::{ScoredVectorPoint, VectorStore};
use sabio_llm::provider::LlmProvider;

/// A chunk returned for a query.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub text: String,
    pub source: String,
    pub chunk_index: u32,
    pub score: f32,
}

impl RetrievedChunk {
    fn from_scored_point(point: &ScoredVectorPoint) -> Option<Self> {
        let text = point.payload.get("text")?.as_str()?.to_owned();
        let source = point.payload.get("source")?.as_str()?.to_owned();
        let chunk_index = u32::try_from(point.payload.get("chunk_index")?.as_u64()?).ok()?;
        Some(Self {
            text,
            source,
            chunk_index,
            score: point.score,
        })
    }
}

/// Similarity search over the indexed corpus.
pub struct Retriever<P, V> {
    store: Arc<V>,
    provider: Arc<P>,
}

impl<P: LlmProvider, V: VectorStore> Retriever<P, V> {
    #[must_use]
    pub fn new(store: Arc<V>, provider: Arc<P>) -> Self {
        Self { store, provider }
    }

    /// Top `k` chunks most similar to `query`, best first.
    ///
    /// Returns an empty list when nothing has been indexed yet; an empty
    /// index is an answerable state, not an error. Points with malformed
    /// payloads are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query or searching the store fails.
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, RetrievalError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if !self.store.collection_exists(CHUNK_COLLECTION).await? {
            tracing::debug!("no indexed corpus, returning empty context");
            return Ok(Vec::new());
        }

        let vector = self.provider.embed(query).await?;
        let limit = u64::try_from(k).unwrap_or(u64::MAX);
        let hits = self.store.search(CHUNK_COLLECTION, vector, limit).await?;

        let chunks: Vec<RetrievedChunk> = hits
            .iter()
            .filter_map(RetrievedChunk::from_scored_point)
            .collect();
        tracing::debug!(requested = k, returned = chunks.len(), "retrieval done");
        Ok(chunks)
    }
}
