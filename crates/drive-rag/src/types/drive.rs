//! File and folder views served by the Drive browsing endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::{ChunkMetadata, SourceDocument};

/// A file with its resolved path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// Slash-joined path of ancestor names
    pub path: String,
    pub modified_time: Option<DateTime<Utc>>,
    pub size: Option<u64>,
    pub web_view_link: Option<String>,
}

impl DriveFile {
    pub fn from_document(doc: &SourceDocument, path: impl Into<String>) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.name.clone(),
            mime_type: doc.mime_type.clone(),
            path: path.into(),
            modified_time: doc.modified_time,
            size: doc.size,
            web_view_link: doc.web_view_link.clone(),
        }
    }
}

impl From<&ChunkMetadata> for DriveFile {
    fn from(meta: &ChunkMetadata) -> Self {
        Self {
            id: meta.document_id.clone(),
            name: meta.document_name.clone(),
            mime_type: meta.mime_type.clone(),
            path: meta.path.clone(),
            modified_time: meta.modified_time,
            size: meta.size,
            web_view_link: meta.web_view_link.clone(),
        }
    }
}

/// A folder with the number of non-folder files directly inside it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFolder {
    pub id: String,
    pub name: String,
    pub path: String,
    pub file_count: usize,
}
