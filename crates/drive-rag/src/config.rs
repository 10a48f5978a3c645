//! Configuration for the RAG pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::document::mime;

/// Main RAG configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// File store configuration (Drive or local directory)
    pub file_store: FileStoreConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Vector index configuration
    pub vector_db: VectorDbConfig,
    /// Ingestion configuration
    pub ingestion: IngestionConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Load from `RAG_CONFIG` (if set) or defaults, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("RAG_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path)?,
            _ => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply secrets and paths from the environment
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(token) = std::env::var("DRIVE_ACCESS_TOKEN") {
            self.file_store.access_token = Some(token);
        }
        if let Ok(dir) = std::env::var("RAG_DATA_DIR") {
            self.vector_db.storage_path = PathBuf::from(dir).join("index.sqlite3");
        }
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be > 0".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::Config("embeddings.batch_size must be > 0".to_string()));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be > 0".to_string()));
        }
        if self.retrieval.default_limit == 0 || self.retrieval.default_limit > self.retrieval.max_limit {
            return Err(Error::Config(format!(
                "retrieval.default_limit must be within 1..={}",
                self.retrieval.max_limit
            )));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

/// Which file store backs ingestion
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileStoreBackend {
    /// Google Drive v3 REST API
    #[default]
    Drive,
    /// Local directory tree
    Local,
}

/// File store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Backend selection
    pub backend: FileStoreBackend,
    /// Drive API base URL
    pub api_base: String,
    /// OAuth access token (obtained outside this crate)
    pub access_token: Option<String>,
    /// Root directory for the local backend
    pub local_root: PathBuf,
    /// Page size for listing
    pub page_size: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            backend: FileStoreBackend::Drive,
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            access_token: None,
            local_root: PathBuf::from("./documents"),
            page_size: 100,
            timeout_secs: 60,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model name
    pub model: String,
    /// Embedding dimensions (1536 for text-embedding-3-small)
    pub dimensions: usize,
    /// Texts per embedding request
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            batch_size: 100,
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL
    pub base_url: String,
    /// API key (usually from `OPENAI_API_KEY`)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Generation model name
    pub generate_model: String,
    /// Output token bound
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// History turns forwarded to the model
    pub history_turns: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            generate_model: "gpt-4o-mini".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            history_turns: 5,
            timeout_secs: 120,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive windows in characters
    pub chunk_overlap: usize,
    /// Texts with fewer non-whitespace-trimmed characters produce no chunks
    pub min_text_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 200,
            min_text_chars: 10,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Result count when the request gives none
    pub default_limit: usize,
    /// Largest accepted limit
    pub max_limit: usize,
    /// Candidates requested from the index before ranking
    pub candidate_pool: usize,
    /// Highlight excerpts per result
    pub max_highlights: usize,
    /// Sentence segments at or below this length are not highlighted
    pub min_segment_chars: usize,
    /// Snippet length in characters
    pub snippet_chars: usize,
    /// Hits scoring at or below this are dropped
    pub min_score: f32,
    /// Sources retrieved per chat message
    pub chat_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            candidate_pool: 50,
            max_highlights: 3,
            min_segment_chars: 10,
            snippet_chars: 200,
            min_score: 0.0,
            chat_top_k: 5,
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// SQLite file backing the index
    pub storage_path: PathBuf,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        let storage_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drive-rag")
            .join("index.sqlite3");

        Self { storage_path }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Mime types eligible for ingestion; unset means the backend's defaults
    /// (see [`IngestionConfig::mime_types`])
    pub supported_mime_types: Option<Vec<String>>,
    /// Default folder scope when a run is started without one
    pub folder_id: Option<String>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            supported_mime_types: None,
            folder_id: None,
        }
    }
}

impl IngestionConfig {
    /// Mime types to ingest from `backend`. Drive defaults to native Google
    /// documents and PDFs; local trees hold exported files, so the default
    /// there covers office formats and plain text instead.
    pub fn mime_types(&self, backend: &FileStoreBackend) -> Vec<String> {
        if let Some(configured) = &self.supported_mime_types {
            return configured.clone();
        }

        let defaults: &[&str] = match backend {
            FileStoreBackend::Drive => &[mime::GOOGLE_DOCUMENT, mime::GOOGLE_SPREADSHEET, mime::PDF],
            FileStoreBackend::Local => &[
                mime::PDF,
                mime::DOCX,
                mime::XLSX,
                mime::PLAIN_TEXT,
                mime::MARKDOWN,
                mime::CSV,
            ],
        };
        defaults.iter().map(|m| m.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.embeddings.batch_size, 100);
        assert_eq!(
            config.ingestion.mime_types(&FileStoreBackend::Drive),
            vec![mime::GOOGLE_DOCUMENT, mime::GOOGLE_SPREADSHEET, mime::PDF]
        );
    }

    #[test]
    fn test_local_backend_mime_defaults() {
        let config = IngestionConfig::default();
        let local = config.mime_types(&FileStoreBackend::Local);
        for expected in [mime::PDF, mime::DOCX, mime::XLSX, mime::PLAIN_TEXT, mime::MARKDOWN, mime::CSV] {
            assert!(local.iter().any(|m| m == expected), "missing {}", expected);
        }
        assert!(!local.iter().any(|m| m == mime::GOOGLE_DOCUMENT));
    }

    #[test]
    fn test_configured_mime_types_win() {
        let config: RagConfig = toml::from_str(
            r#"
            [file_store]
            backend = "local"

            [ingestion]
            supported_mime_types = ["text/plain"]
            "#,
        )
        .unwrap();
        assert_eq!(
            config.ingestion.mime_types(&config.file_store.backend),
            vec!["text/plain"]
        );
    }

    #[test]
    fn test_overlap_must_be_smaller_than_window() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = 800;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RagConfig = toml::from_str(
            r#"
            [chunking]
            chunk_size = 400
            chunk_overlap = 50

            [file_store]
            backend = "local"
            local_root = "/srv/docs"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.chunk_size, 400);
        assert_eq!(config.chunking.min_text_chars, 10);
        assert_eq!(config.file_store.backend, FileStoreBackend::Local);
        assert_eq!(config.file_store.local_root, PathBuf::from("/srv/docs"));
        assert_eq!(config.llm.max_tokens, 1000);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rag.toml");
        std::fs::write(&path, "[retrieval]\ncandidate_pool = 25\n").unwrap();

        let config = RagConfig::from_file(&path).unwrap();
        assert_eq!(config.retrieval.candidate_pool, 25);
        assert_eq!(config.retrieval.default_limit, 10);
    }
}
