//! File store trait for enumerating and downloading source documents

use async_trait::async_trait;
use bytes::Bytes;
use crate::error::Result;
use crate::types::SourceDocument;

/// Trait for the external file store that holds the documents
///
/// Implementations:
/// - `GoogleDriveStore`: Google Drive v3 REST API
/// - `LocalFileStore`: local directory tree
#[async_trait]
pub trait FileStore: Send + Sync {
    /// List non-trashed files, optionally restricted to one folder's direct children
    async fn list(&self, folder_id: Option<&str>) -> Result<Vec<SourceDocument>>;

    /// Download raw file content
    async fn fetch_bytes(&self, file_id: &str) -> Result<Bytes>;

    /// Export a native document to `target_mime`
    async fn export(&self, file_id: &str, target_mime: &str) -> Result<Bytes>;

    /// Metadata of a single file or folder
    async fn metadata(&self, file_id: &str) -> Result<SourceDocument>;

    /// Slash-joined path of ancestor names ending in the file's own name
    async fn resolve_path(&self, file_id: &str) -> Result<String>;

    /// Check if the store is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
