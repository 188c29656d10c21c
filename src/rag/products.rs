//! Ordering recommended products by tag relevance to an answer.

use crate::vector_store::{metadata_str, Metadata};
use serde::{Deserialize, Serialize};

/// A product recommended alongside an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedProduct {
    pub title: String,
    /// Comma-separated tags.
    pub tags: String,
    pub link: String,
}

impl RelatedProduct {
    /// Build from product-index metadata.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            title: metadata_str(metadata, "title").unwrap_or("Untitled").to_string(),
            tags: metadata_str(metadata, "tags").unwrap_or_default().to_string(),
            link: metadata_str(metadata, "link").unwrap_or_default().to_string(),
        }
    }

    /// Individual tags, trimmed, empties skipped.
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        self.tags.split(',').map(str::trim).filter(|t| !t.is_empty())
    }

    /// Whether any tag occurs in the (already lowercased) answer.
    fn matches(&self, answer_lower: &str) -> bool {
        self.tag_list()
            .any(|tag| answer_lower.contains(&tag.to_lowercase()))
    }
}

/// Put products whose tags appear in `answer` first.
///
/// Matching is a case-insensitive substring test per tag. Relative order is
/// kept within the matching and non-matching groups.
pub fn partition_products(answer: &str, products: Vec<RelatedProduct>) -> Vec<RelatedProduct> {
    let answer_lower = answer.to_lowercase();
    let (mut matching, non_matching): (Vec<_>, Vec<_>) = products
        .into_iter()
        .partition(|p| p.matches(&answer_lower));

    matching.extend(non_matching);
    matching
}
