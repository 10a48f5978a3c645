//! drive-rag: retrieval-augmented question answering over Drive documents
//!
//! Files are listed from a [`providers::FileStore`], converted to text,
//! chunked, embedded and written to a [`providers::VectorIndex`]. Queries are
//! embedded the same way, ranked against the index, and handed to an LLM
//! together with the retrieved passages to produce a cited answer.
//!
//! At most one ingestion run is active per [`server::state::AppState`].

pub mod browse;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use server::state::AppState;
pub use types::{
    document::{Chunk, ChunkMetadata, SourceDocument},
    drive::{DriveFile, DriveFolder},
    query::{ChatRequest, SearchRequest},
    response::{ChatResponse, IngestionRun, SearchResult},
};
