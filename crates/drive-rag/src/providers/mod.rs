//! Provider abstractions for the file store, embeddings, LLM and vector index
//!
//! Trait-based seams so the pipeline can run against Drive or a local
//! directory, any OpenAI-compatible endpoint, and in-memory test doubles.

pub mod embedding;
pub mod file_store;
pub mod llm;
pub mod vector_store;
pub mod drive;
pub mod local;
pub mod openai;

#[cfg(test)]
pub mod mock;

pub use embedding::EmbeddingProvider;
pub use file_store::FileStore;
pub use llm::{ChatMessage, LlmProvider};
pub use vector_store::{IndexEntry, IndexHit, MetadataFilter, VectorIndex};
pub use drive::GoogleDriveStore;
pub use local::LocalFileStore;
pub use openai::OpenAiClient;
