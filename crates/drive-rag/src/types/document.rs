//! Source documents and chunks with provenance metadata for citations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Well-known mime types
pub mod mime {
    pub const GOOGLE_DOCUMENT: &str = "application/vnd.google-apps.document";
    pub const GOOGLE_SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
    pub const GOOGLE_PRESENTATION: &str = "application/vnd.google-apps.presentation";
    pub const GOOGLE_FOLDER: &str = "application/vnd.google-apps.folder";
    pub const PDF: &str = "application/pdf";
    pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
    pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
    pub const PLAIN_TEXT: &str = "text/plain";
    pub const MARKDOWN: &str = "text/markdown";
    pub const CSV: &str = "text/csv";
}

/// Extraction class of a file, derived from its mime type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MimeClass {
    /// Google Docs document (exported as plain text)
    GoogleDocument,
    /// Google Sheets spreadsheet (exported as CSV)
    GoogleSpreadsheet,
    /// Google Slides presentation (exported as plain text)
    GooglePresentation,
    /// Drive folder
    Folder,
    /// PDF document
    Pdf,
    /// Word document (.docx)
    Docx,
    /// Excel workbook (.xlsx)
    Xlsx,
    /// Plain text or markdown
    PlainText,
    /// CSV file
    Csv,
    /// Anything else
    Other(String),
}

impl MimeClass {
    /// Classify a mime type string
    pub fn from_mime(mime_type: &str) -> Self {
        match mime_type {
            mime::GOOGLE_DOCUMENT => Self::GoogleDocument,
            mime::GOOGLE_SPREADSHEET => Self::GoogleSpreadsheet,
            mime::GOOGLE_PRESENTATION => Self::GooglePresentation,
            mime::GOOGLE_FOLDER => Self::Folder,
            mime::PDF => Self::Pdf,
            mime::DOCX => Self::Docx,
            mime::XLSX => Self::Xlsx,
            mime::PLAIN_TEXT | mime::MARKDOWN => Self::PlainText,
            mime::CSV => Self::Csv,
            other => Self::Other(other.to_string()),
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::GoogleDocument => "Google Doc",
            Self::GoogleSpreadsheet => "Google Sheet",
            Self::GooglePresentation => "Google Slides",
            Self::Folder => "Folder",
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Xlsx => "Excel Spreadsheet (.xlsx)",
            Self::PlainText => "Text File",
            Self::Csv => "CSV",
            Self::Other(mime_type) => mime_type.as_str(),
        }
    }
}

/// File metadata snapshot as reported by the file store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    /// External file id
    pub id: String,
    /// File name
    pub name: String,
    /// Raw mime type
    pub mime_type: String,
    /// Size in bytes (Drive omits it for native Google files)
    pub size: Option<u64>,
    /// Last modification time
    pub modified_time: Option<DateTime<Utc>>,
    /// Parent folder ids
    #[serde(default)]
    pub parents: Vec<String>,
    /// Browser link to the file
    pub web_view_link: Option<String>,
}

impl SourceDocument {
    /// Create a document snapshot with the required fields
    pub fn new(id: impl Into<String>, name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            size: None,
            modified_time: None,
            parents: Vec::new(),
            web_view_link: None,
        }
    }

    /// Set the parent folder
    pub fn with_parent(mut self, folder_id: impl Into<String>) -> Self {
        self.parents.push(folder_id.into());
        self
    }

    /// Extraction class of this file
    pub fn mime_class(&self) -> MimeClass {
        MimeClass::from_mime(&self.mime_type)
    }

    /// Immediate folder, used for folder-scoped search
    pub fn folder_id(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }
}

/// Metadata attached to every chunk and stored alongside its vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// Owning document id
    pub document_id: String,
    /// Owning document name
    pub document_name: String,
    /// Raw mime type of the document
    pub mime_type: String,
    /// Slash-joined path of ancestor names
    pub path: String,
    /// Document modification time
    pub modified_time: Option<DateTime<Utc>>,
    /// Document size in bytes
    pub size: Option<u64>,
    /// Browser link to the document
    pub web_view_link: Option<String>,
    /// Immediate folder id
    pub folder_id: Option<String>,
    /// Chunk ordinal within the document
    pub chunk_index: u32,
}

impl ChunkMetadata {
    /// Build document-level metadata (ordinal 0) for a source document
    pub fn for_document(doc: &SourceDocument, path: impl Into<String>) -> Result<Self> {
        if doc.id.trim().is_empty() {
            return Err(Error::validation("document id must not be empty"));
        }
        if doc.name.trim().is_empty() {
            return Err(Error::validation(format!(
                "document '{}' has an empty name",
                doc.id
            )));
        }

        Ok(Self {
            document_id: doc.id.clone(),
            document_name: doc.name.clone(),
            mime_type: doc.mime_type.clone(),
            path: path.into(),
            modified_time: doc.modified_time,
            size: doc.size,
            web_view_link: doc.web_view_link.clone(),
            folder_id: doc.folder_id().map(str::to_string),
            chunk_index: 0,
        })
    }

    /// Link to show next to citations
    pub fn link(&self) -> &str {
        self.web_view_link.as_deref().unwrap_or("#")
    }
}

/// Index key for a chunk: `{document_id}_chunk_{ordinal}`
pub fn chunk_key(document_id: &str, chunk_index: u32) -> String {
    format!("{}_chunk_{}", document_id, chunk_index)
}

/// A window of text from one document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Text span
    pub text: String,
    /// Character offset of the span within the extracted text
    pub char_start: usize,
    /// Document metadata with this chunk's ordinal
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Chunk ordinal within its document
    pub fn index(&self) -> u32 {
        self.metadata.chunk_index
    }

    /// Owning document id
    pub fn document_id(&self) -> &str {
        &self.metadata.document_id
    }

    /// Vector index key
    pub fn key(&self) -> String {
        chunk_key(&self.metadata.document_id, self.metadata.chunk_index)
    }
}
