//! Fixed-window text chunking with character offsets

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkMetadata};

/// Sliding-window chunker over characters
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Window size in characters
    chunk_size: usize,
    /// Overlap between consecutive windows
    overlap: usize,
    /// Texts with fewer trimmed characters produce no chunks
    min_chars: usize,
}

impl TextChunker {
    /// Create a new chunker; the overlap must be smaller than the window
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk size must be > 0".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
            min_chars: 10,
        })
    }

    /// Create from config
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Ok(Self::new(config.chunk_size, config.chunk_overlap)?.with_min_chars(config.min_text_chars))
    }

    /// Texts with fewer trimmed chars than `min_chars` produce no chunks
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Distance between consecutive window starts
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Split `text` into windows, each carrying `metadata` with its own ordinal
    pub fn chunk(&self, text: &str, metadata: &ChunkMetadata) -> Vec<Chunk> {
        if text.trim().chars().count() < self.min_chars {
            return Vec::new();
        }

        // Byte offset of every char, plus the end of the string
        let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let char_len = bounds.len();
        bounds.push(text.len());

        let mut chunks = Vec::with_capacity(char_len.div_ceil(self.stride()));
        let mut start = 0usize;
        let mut ordinal = 0u32;

        while start < char_len {
            let end = (start + self.chunk_size).min(char_len);
            let mut chunk_meta = metadata.clone();
            chunk_meta.chunk_index = ordinal;

            chunks.push(Chunk {
                text: text[bounds[start]..bounds[end]].to_string(),
                char_start: start,
                metadata: chunk_meta,
            });

            ordinal += 1;
            start += self.stride();
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            overlap: 200,
            min_chars: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::mime;
    use crate::types::SourceDocument;

    fn metadata() -> ChunkMetadata {
        let doc = SourceDocument::new("doc-1", "Notes", mime::GOOGLE_DOCUMENT);
        ChunkMetadata::for_document(&doc, "/Notes").unwrap()
    }

    fn sample(len: usize) -> String {
        "abcdefghijklmnopqrstuvwxyz0123456789"
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_window() {
        assert!(TextChunker::new(800, 800).is_err());
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(800, 200).is_ok());
    }

    #[test]
    fn test_short_text_produces_nothing() {
        let chunker = TextChunker::default();
        assert!(chunker.chunk("", &metadata()).is_empty());
        assert!(chunker.chunk("   tiny   \n", &metadata()).is_empty());
        assert_eq!(chunker.chunk("ten chars!", &metadata()).len(), 1);
    }

    #[test]
    fn test_min_chars_threshold_is_configurable() {
        let chunker = TextChunker::default().with_min_chars(20);
        assert!(chunker.chunk("ten chars!", &metadata()).is_empty());
        assert_eq!(chunker.chunk("twenty chars exactly", &metadata()).len(), 1);
    }

    #[test]
    fn test_thousand_chars_gives_two_windows() {
        let chunker = TextChunker::default();
        let chunks = chunker.chunk(&sample(1000), &metadata());

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].char_start, 0);
        assert_eq!(chunks[1].char_start, 600);
        assert_eq!(chunks[0].text.chars().count(), 800);
        assert_eq!(chunks[1].text.chars().count(), 400);
        assert_eq!(chunks[1].index(), 1);
        assert_eq!(chunks[1].key(), "doc-1_chunk_1");
    }

    #[test]
    fn test_count_and_reconstruction() {
        let chunker = TextChunker::new(50, 15).unwrap();
        for len in [10, 35, 36, 50, 51, 200, 777] {
            let text = sample(len);
            let chunks = chunker.chunk(&text, &metadata());
            assert_eq!(chunks.len(), len.div_ceil(35), "length {}", len);

            let rebuilt: String = chunks
                .iter()
                .map(|c| c.text.chars().take(chunker.stride()).collect::<String>())
                .collect();
            assert_eq!(rebuilt, text);

            for (i, chunk) in chunks.iter().enumerate() {
                assert_eq!(chunk.index(), i as u32);
                assert!(chunk.text.chars().count() <= 50);
            }
        }
    }

    #[test]
    fn test_multibyte_text_is_split_on_char_boundaries() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let text = "héllo wörld ünïcode";
        let chunks = chunker.chunk(text, &metadata());
        assert_eq!(chunks[0].text, "héll");
        assert_eq!(chunks[1].text, "lo w");
        assert_eq!(chunks[1].char_start, 3);
    }

    #[test]
    fn test_text_is_not_trimmed() {
        let chunker = TextChunker::new(20, 5).unwrap();
        let chunks = chunker.chunk("  leading spaces are kept", &metadata());
        assert!(chunks[0].text.starts_with("  leading"));
    }
}
