//! Fixed-window chunking implementation.

use super::{Chunker, ChunkingConfig, ContentChunk};

/// Character-window chunker.
///
/// Emits windows of `chunk_size` characters, each starting
/// `chunk_size - chunk_overlap` characters after the previous one.
pub struct FixedChunker;

impl FixedChunker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FixedChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for FixedChunker {
    fn chunk(&self, text: &str, config: &ChunkingConfig) -> Vec<ContentChunk> {
        let chars: Vec<char> = text.chars().collect();
        let step = config.chunk_size.saturating_sub(config.chunk_overlap).max(1);

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut order = 0;

        while start < chars.len() {
            let end = (start + config.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            let content = window.trim();

            if !content.is_empty() {
                chunks.push(ContentChunk::new(content.to_string(), order));
                order += 1;
            }

            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}
