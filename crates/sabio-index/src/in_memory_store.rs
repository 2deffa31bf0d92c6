//! In-memory vector store for tests and ephemeral runs.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::vector_store::{
    ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError, cosine_similarity,
};

struct StoredPoint {
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
}

struct Collection {
    points: HashMap<String, StoredPoint>,
}

pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of points in a collection, 0 if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn len(&self, collection: &str) -> Result<usize, VectorStoreError> {
        let cols = self
            .collections
            .read()
            .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
        Ok(cols.get(collection).map_or(0, |c| c.points.len()))
    }

    /// Whether a collection is empty or missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self, collection: &str) -> Result<bool, VectorStoreError> {
        Ok(self.len(collection)? == 0)
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore").finish_non_exhaustive()
    }
}

impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(
        &self,
        collection: &str,
        _vector_size: u64,
    ) -> Result<(), VectorStoreError> {
        let mut cols = self
            .collections
            .write()
            .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
        cols.entry(collection.to_owned()).or_insert_with(|| Collection {
            points: HashMap::new(),
        });
        Ok(())
    }

    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorStoreError> {
        let cols = self
            .collections
            .read()
            .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
        Ok(cols.contains_key(collection))
    }

    async fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorStoreError> {
        let mut cols = self
            .collections
            .write()
            .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
        let col = cols
            .get_mut(collection)
            .ok_or_else(|| VectorStoreError::Upsert(format!("collection {collection} not found")))?;
        for p in points {
            col.points.insert(
                p.id,
                StoredPoint {
                    vector: p.vector,
                    payload: p.payload,
                },
            );
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredVectorPoint>, VectorStoreError> {
        let cols = self
            .collections
            .read()
            .map_err(|e| VectorStoreError::Search(e.to_string()))?;
        let col = cols
            .get(collection)
            .ok_or_else(|| VectorStoreError::Search(format!("collection {collection} not found")))?;

        let mut scored: Vec<ScoredVectorPoint> = col
            .points
            .iter()
            .map(|(id, p)| ScoredVectorPoint {
                id: id.clone(),
                score: cosine_similarity(&vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(scored)
    }
}
