//! Retrieved transcript context.

use crate::vector_store::{metadata_str, Match};

/// A transcript chunk retrieved for a question.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceChunk {
    /// Record id in the transcript index.
    pub id: String,
    /// Video title.
    pub title: String,
    /// Chunk text.
    pub text: String,
    /// Source video URL, empty when the transcript had none.
    pub url: String,
    /// Similarity score.
    pub score: f32,
}

impl From<Match> for SourceChunk {
    fn from(m: Match) -> Self {
        Self {
            title: metadata_str(&m.metadata, "title").unwrap_or_default().to_string(),
            text: metadata_str(&m.metadata, "text").unwrap_or_default().to_string(),
            url: metadata_str(&m.metadata, "url").unwrap_or_default().to_string(),
            score: m.score,
            id: m.id,
        }
    }
}

/// Join chunk texts for the prompt's context slot.
pub fn format_context_for_prompt(chunks: &[SourceChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
