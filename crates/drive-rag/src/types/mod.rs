//! Core types for the RAG pipeline

pub mod document;
pub mod drive;
pub mod query;
pub mod response;

pub use document::{chunk_key, Chunk, ChunkMetadata, MimeClass, SourceDocument};
pub use drive::{DriveFile, DriveFolder};
pub use query::{ChatRequest, ConversationTurn, Role, SearchRequest};
pub use response::{ChatResponse, IngestionRun, SearchResult, StartAck};
