//! JSON-snapshot vector store persisted under a local directory.
//!
//! Collections live in memory and are written to `<root>/<collection>.json`
//! on [`VectorStore::flush`]. Existing snapshots load eagerly on open, so an
//! indexed corpus survives restarts without re-embedding.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::vector_store::{
    ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError, cosine_similarity,
};

pub struct DiskVectorStore {
    root: PathBuf,
    collections: RwLock<HashMap<String, HashMap<String, VectorPoint>>>,
}

impl DiskVectorStore {
    /// Open a store rooted at `root`, creating the directory and loading any
    /// existing collection snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or a snapshot is
    /// unreadable or malformed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, VectorStoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            VectorStoreError::Persist(format!("creating {}: {e}", root.display()))
        })?;

        let mut collections = HashMap::new();
        let entries = fs::read_dir(&root)
            .map_err(|e| VectorStoreError::Persist(format!("reading {}: {e}", root.display())))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| VectorStoreError::Persist(format!("reading snapshot: {e}")))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(name) = path.file_stem().and_then(|s| s.to_str())
            {
                collections.insert(name.to_owned(), load_snapshot(&path)?);
            }
        }
        tracing::debug!(
            root = %root.display(),
            collections = collections.len(),
            "opened vector store"
        );

        Ok(Self {
            root,
            collections: RwLock::new(collections),
        })
    }

    fn snapshot_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.json"))
    }
}

impl std::fmt::Debug for DiskVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskVectorStore")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

fn load_snapshot(path: &Path) -> Result<HashMap<String, VectorPoint>, VectorStoreError> {
    let data = fs::read(path)
        .map_err(|e| VectorStoreError::Persist(format!("reading {}: {e}", path.display())))?;
    let points: Vec<VectorPoint> = serde_json::from_slice(&data)
        .map_err(|e| VectorStoreError::Persist(format!("parsing {}: {e}", path.display())))?;
    Ok(points.into_iter().map(|p| (p.id.clone(), p)).collect())
}

impl VectorStore for DiskVectorStore {
    async fn ensure_collection(
        &self,
        collection: &str,
        _vector_size: u64,
    ) -> Result<(), VectorStoreError> {
        let mut cols = self
            .collections
            .write()
            .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
        cols.entry(collection.to_owned()).or_default();
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
            col.insert(p.id.clone(), p);
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
            .values()
            .map(|p| ScoredVectorPoint {
                id: p.id.clone(),
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

    async fn flush(&self, collection: &str) -> Result<(), VectorStoreError> {
        let points: Vec<VectorPoint> = {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Persist(e.to_string()))?;
            let col = cols.get(collection).ok_or_else(|| {
                VectorStoreError::Persist(format!("collection {collection} not found"))
            })?;
            col.values().cloned().collect()
        };

        let path = self.snapshot_path(collection);
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_vec(&points)
            .map_err(|e| VectorStoreError::Persist(format!("serializing {collection}: {e}")))?;
        fs::write(&tmp, data)
            .map_err(|e| VectorStoreError::Persist(format!("writing {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| VectorStoreError::Persist(format!("renaming {}: {e}", path.display())))?;
        tracing::debug!(collection, points = points.len(), "flushed snapshot");
        Ok(())
    }
}
