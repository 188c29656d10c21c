//! Content chunking strategies for breaking transcripts into searchable segments.
//!
//! Chunk lengths are counted in characters, never bytes.

mod fixed;
mod recursive;

pub use fixed::FixedChunker;
pub use recursive::RecursiveChunker;

use crate::config::ChunkingSettings;
use crate::error::{Result, ShoptalkError};
use serde::{Deserialize, Serialize};

/// A chunk of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Order of this chunk in the transcript.
    pub order: usize,
}

impl ContentChunk {
    /// Create a new content chunk.
    pub fn new(content: String, order: usize) -> Self {
        Self { content, order }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// Split on paragraph, line, then word boundaries.
    Recursive,
    /// Plain character windows.
    Fixed,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recursive" => Ok(ChunkingStrategy::Recursive),
            "fixed" | "character" => Ok(ChunkingStrategy::Fixed),
            _ => Err(format!("Unknown chunking strategy: {}", s)),
        }
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters carried over from the previous chunk.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    /// Create a validated chunking configuration.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ShoptalkError::InvalidInput(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(ShoptalkError::InvalidInput(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Build a configuration from settings.
    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }
}

/// Trait for content chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split transcript text into content chunks.
    fn chunk(&self, text: &str, config: &ChunkingConfig) -> Vec<ContentChunk>;
}

/// Create a chunker based on the strategy.
pub fn create_chunker(strategy: ChunkingStrategy) -> Box<dyn Chunker> {
    match strategy {
        ChunkingStrategy::Recursive => Box::new(RecursiveChunker::new()),
        ChunkingStrategy::Fixed => Box::new(FixedChunker::new()),
    }
}
