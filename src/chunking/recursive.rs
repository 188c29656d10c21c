//! Recursive separator-based chunking.
//!
//! Splits on the coarsest separator present in the text (paragraphs, then
//! lines, then words, then characters), merges the pieces back into chunks no
//! longer than the target size, and carries a tail of each chunk into the next.

use super::{Chunker, ChunkingConfig, ContentChunk};
use std::collections::VecDeque;
use tracing::warn;

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive character chunker.
pub struct RecursiveChunker {
    separators: Vec<String>,
}

impl RecursiveChunker {
    pub fn new() -> Self {
        Self::with_separators(DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect())
    }

    /// Use a custom separator hierarchy, coarsest first.
    pub fn with_separators(separators: Vec<String>) -> Self {
        Self { separators }
    }

    fn split(&self, text: &str, separators: &[String], config: &ChunkingConfig) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];

        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < config.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(merge_pieces(&pending, config));
                pending.clear();
            }

            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split(&piece, remaining, config));
            }
        }

        if !pending.is_empty() {
            chunks.extend(merge_pieces(&pending, config));
        }

        chunks
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, text: &str, config: &ChunkingConfig) -> Vec<ContentChunk> {
        self.split(text, &self.separators, config)
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .enumerate()
            .map(|(order, content)| ContentChunk::new(content, order))
            .collect()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` on `separator`, keeping the separator at the start of each
/// following piece. An empty separator splits into characters.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(text[start..idx].to_string());
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(text[start..].to_string());
    }

    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Greedily merge small pieces into chunks, keeping up to `chunk_overlap`
/// characters of the previous chunk at the head of the next.
fn merge_pieces(pieces: &[String], config: &ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<(&str, usize)> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let len = char_len(piece);

        if total + len > config.chunk_size && !window.is_empty() {
            if total > config.chunk_size {
                warn!(
                    "Created a chunk of size {}, which is longer than the specified {}",
                    total, config.chunk_size
                );
            }

            let joined: String = window.iter().map(|(p, _)| *p).collect();
            let trimmed = joined.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            while total > config.chunk_overlap || (total + len > config.chunk_size && total > 0) {
                match window.pop_front() {
                    Some((_, dropped)) => total -= dropped,
                    None => break,
                }
            }
        }

        window.push_back((piece.as_str(), len));
        total += len;
    }

    let joined: String = window.iter().map(|(p, _)| *p).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }

    chunks
}
