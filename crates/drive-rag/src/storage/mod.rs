//! Storage module for persistent data storage
//!
//! Provides the SQLite-backed vector index.

mod sqlite_index;

pub use sqlite_index::{cosine_similarity, SqliteVectorIndex};
