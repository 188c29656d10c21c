//! Transcript documents: text extraction and header metadata.

mod docx;

pub use docx::extract_docx_text;

#[cfg(test)]
pub(crate) use docx::tests::docx_from_lines;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Title used when a transcript has no usable first line.
pub const UNTITLED: &str = "Untitled Video";

/// Number of leading lines searched for a video URL.
const HEADER_LINES: usize = 5;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"')\]]+"#).expect("valid regex"));

/// Metadata derived from a transcript's header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    /// Video title (the first line of the transcript).
    pub title: String,
    /// Source video URL, if the header carries one.
    pub url: Option<String>,
}

impl TranscriptMetadata {
    /// Derive metadata from transcript text.
    pub fn from_text(text: &str) -> Self {
        let title = text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or(UNTITLED)
            .to_string();

        let url = text
            .lines()
            .take(HEADER_LINES)
            .find_map(|line| URL_RE.find(line))
            .map(|m| m.as_str())
            .filter(|candidate| url::Url::parse(candidate).is_ok())
            .map(str::to_string);

        Self { title, url }
    }

    /// Replace the detected URL with an explicit one.
    pub fn with_url(mut self, url: Option<String>) -> Self {
        if let Some(u) = url.filter(|u| !u.trim().is_empty()) {
            self.url = Some(u.trim().to_string());
        }
        self
    }
}

/// Check whether a file name has the `.docx` extension.
pub fn is_docx_filename(name: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("docx"))
}
