//! Document ingestion and semantic retrieval.
//!
//! Plain-text documents are split into overlapping chunks, embedded via an
//! LLM provider, and stored in a vector store. Queries are embedded with the
//! same provider and answered by cosine similarity search over the chunks.

pub mod chunker;
pub mod disk_store;
pub mod error;
pub mod in_memory_store;
pub mod indexer;
pub mod loader;
pub mod retriever;
pub mod vector_store;

pub use error::{IngestionError, RetrievalError};
pub use indexer::{CHUNK_COLLECTION, CorpusIndexer, IndexReport};
pub use retriever::{RetrievedChunk, Retriever};
pub use vector_store::{ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};
