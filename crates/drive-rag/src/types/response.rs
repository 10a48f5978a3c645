//! Response types: search hits, chat answers, ingestion status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::ChunkMetadata;
use super::drive::DriveFile;

/// A ranked chunk returned by search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Index key of the chunk
    pub key: String,
    /// Owning file as shown to clients
    pub file: DriveFile,
    /// Full chunk text
    pub text: String,
    /// Chunk and document metadata
    pub metadata: ChunkMetadata,
    /// Relevance in [0, 1], 1 = best match
    pub relevance_score: f32,
    /// Short excerpt centred on the first query term hit
    pub snippet: String,
    /// Sentence-like excerpts containing query terms
    #[serde(default)]
    pub highlights: Vec<String>,
}

impl SearchResult {
    /// Result for an indexed chunk; the `file` view is derived from `metadata`
    pub fn new(
        key: impl Into<String>,
        text: impl Into<String>,
        metadata: ChunkMetadata,
        relevance_score: f32,
        snippet: impl Into<String>,
        highlights: Vec<String>,
    ) -> Self {
        Self {
            key: key.into(),
            file: DriveFile::from(&metadata),
            text: text.into(),
            metadata,
            relevance_score,
            snippet: snippet.into(),
            highlights,
        }
    }

    /// Owning document id
    pub fn document_id(&self) -> &str {
        &self.metadata.document_id
    }
}

/// Chat answer with the passages it was grounded on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Answer text
    pub message: String,
    /// Retrieved passages given to the model
    pub sources: Vec<SearchResult>,
}

impl ChatResponse {
    /// Create an answer without sources
    pub fn without_sources(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sources: Vec::new(),
        }
    }
}

/// Acknowledgement for a start request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAck {
    pub accepted: bool,
    pub run_id: Uuid,
    pub message: String,
}

/// Snapshot of the ingestion state machine
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IngestionRun {
    /// Running flag
    pub is_ingesting: bool,
    /// Id of the current or most recent run
    pub run_id: Option<Uuid>,
    /// Supported files found for the run
    pub total_files: usize,
    /// 1-based index of the file being (or last) processed
    pub processed_files: usize,
    /// Files skipped because they had no extractable text
    pub skipped_files: usize,
    /// Files that failed extraction, embedding or storage
    pub failed_files: usize,
    /// Chunks written to the index during the run
    pub chunks_indexed: usize,
    /// Name of the file being processed
    pub current_file: Option<String>,
    /// Run-aborting error, kept until the next run starts
    pub error: Option<String>,
    /// Informational completion note
    pub message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl IngestionRun {
    /// Progress as a percentage of supported files
    pub fn percent_complete(&self) -> f32 {
        if self.total_files == 0 {
            return 0.0;
        }
        self.processed_files as f32 / self.total_files as f32 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::{mime, SourceDocument};

    #[test]
    fn test_status_serializes_camel_case() {
        let run = IngestionRun {
            is_ingesting: true,
            total_files: 4,
            processed_files: 1,
            current_file: Some("Budget".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["isIngesting"], true);
        assert_eq!(json["totalFiles"], 4);
        assert_eq!(json["processedFiles"], 1);
        assert_eq!(json["currentFile"], "Budget");
        assert_eq!(run.percent_complete(), 25.0);
    }

    #[test]
    fn test_search_result_carries_file_view() {
        let mut doc = SourceDocument::new("d1", "Budget", mime::GOOGLE_SPREADSHEET);
        doc.web_view_link = Some("https://drive/d1".to_string());
        let meta = ChunkMetadata::for_document(&doc, "/Finance/Budget").unwrap();
        let result = SearchResult::new("d1_chunk_0", "Q3 is 1.2M", meta, 0.7, "Q3 is 1.2M", vec![]);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["file"]["id"], "d1");
        assert_eq!(json["file"]["name"], "Budget");
        assert_eq!(json["file"]["mimeType"], mime::GOOGLE_SPREADSHEET);
        assert_eq!(json["file"]["path"], "/Finance/Budget");
        assert_eq!(json["file"]["webViewLink"], "https://drive/d1");
        assert!(json["file"]["modifiedTime"].is_null());
        assert_eq!(json["snippet"], "Q3 is 1.2M");
        assert_eq!(json["highlights"], serde_json::json!([]));
        assert!((json["relevanceScore"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }
}
