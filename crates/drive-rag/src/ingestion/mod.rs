//! Document ingestion: text extraction, chunking and embedding

mod chunker;
mod embedder;
mod extractor;

pub use chunker::TextChunker;
pub use embedder::{is_zero_vector, BatchEmbedder};
pub use extractor::{csv_text, decode_text, DocumentExtractor};
