//! Vector store abstraction.

use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("collection error: {0}")]
    Collection(String),
    #[error("upsert error: {0}")]
    Upsert(String),
    #[error("search error: {0}")]
    Search(String),
    #[error("persistence error: {0}")]
    Persist(String),
}

/// An embedded chunk ready for storage.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: HashMap<String, serde_json::Value>,
}

/// A search result with its cosine similarity score.
#[derive(Debug, Clone)]
pub struct ScoredVectorPoint {
    pub id: String,
    pub score: f32,
    pub payload: HashMap<String, serde_json::Value>,
}

pub trait VectorStore: Send + Sync {
    /// Create the collection if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage rejects the operation.
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> impl Future<Output = Result<(), VectorStoreError>> + Send;

    fn collection_exists(
        &self,
        collection: &str,
    ) -> impl Future<Output = Result<bool, VectorStoreError>> + Send;

    /// Insert or overwrite points by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is missing or storage fails.
    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> impl Future<Output = Result<(), VectorStoreError>> + Send;

    /// Top `limit` points by cosine similarity, descending.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is missing or storage fails.
    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<ScoredVectorPoint>, VectorStoreError>> + Send;

    /// Durably persist the collection. A no-op for stores without a disk
    /// representation.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the snapshot fails.
    fn flush(&self, collection: &str) -> impl Future<Output = Result<(), VectorStoreError>> + Send {
        let _ = collection;
        async { Ok(()) }
    }
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_orthogonal_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_zero_vector_is_zero() {
        let sim = cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]);
        assert!(sim.abs() < f32::EPSILON);
    }
}
