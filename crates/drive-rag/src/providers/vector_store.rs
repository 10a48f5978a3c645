//! Vector index trait for storing and searching chunk embeddings

use async_trait::async_trait;
use crate::error::{Error, Result};
use crate::types::ChunkMetadata;

/// Metadata restriction applied before ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataFilter {
    /// Only chunks of this document
    Document(String),
    /// Only chunks whose document sits directly in this folder
    Folder(String),
}

impl MetadataFilter {
    /// Build a filter from request scope. A file id takes precedence over a folder id.
    pub fn from_scope(folder_id: Option<&str>, file_id: Option<&str>) -> Result<Option<Self>> {
        if let Some(file_id) = file_id {
            if file_id.trim().is_empty() {
                return Err(Error::validation("fileId must not be blank"));
            }
            return Ok(Some(Self::Document(file_id.to_string())));
        }
        if let Some(folder_id) = folder_id {
            if folder_id.trim().is_empty() {
                return Err(Error::validation("folderId must not be blank"));
            }
            return Ok(Some(Self::Folder(folder_id.to_string())));
        }
        Ok(None)
    }
}

/// One entry to write into the index
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// `{document_id}_chunk_{n}`
    pub key: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Nearest-neighbour hit from the index
#[derive(Debug, Clone)]
pub struct IndexHit {
    pub key: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Cosine distance in [0, 2], 0 = identical direction
    pub distance: f32,
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `SqliteVectorIndex`: SQLite table with brute-force cosine ranking
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace entries by key
    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<usize>;

    /// Return up to `top_k` entries nearest to `vector`, ascending by distance
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexHit>>;

    /// Get total number of vectors stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
