//! Query-time retrieval

pub mod search;

pub use search::{build_snippet, extract_highlights, query_tokens, score_from_distance, RetrievalEngine};
