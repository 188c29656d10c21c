//! Vector store abstraction for Shoptalk.
//!
//! Provides a trait-based interface over named vector indexes. Pinecone is the
//! production backend; the in-memory and SQLite stores serve local development
//! and tests.

mod memory;
mod pinecone;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use pinecone::PineconeVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::config::Settings;
use crate::error::{Result, ShoptalkError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Arbitrary JSON metadata attached to a record.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A vector with its id and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique id within the index.
    pub id: String,
    /// Embedding vector.
    pub values: Vec<f32>,
    /// Record metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Record {
    pub fn new(id: impl Into<String>, values: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            values,
            metadata,
        }
    }
}

/// A query hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    /// Similarity score (higher is better).
    pub score: f32,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Similarity metric of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

impl Metric {
    /// Score two vectors so that higher means more similar.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::Cosine => cosine_similarity(a, b),
            Metric::DotProduct => a.iter().zip(b.iter()).map(|(x, y)| x * y).sum(),
            Metric::Euclidean => -a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>(),
        }
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" => Ok(Metric::Euclidean),
            "dotproduct" => Ok(Metric::DotProduct),
            _ => Err(format!("Unknown metric: {}", s)),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Cosine => write!(f, "cosine"),
            Metric::Euclidean => write!(f, "euclidean"),
            Metric::DotProduct => write!(f, "dotproduct"),
        }
    }
}

/// Parameters for creating an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: Metric,
}

/// Summary statistics of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub dimension: usize,
    pub total_vector_count: usize,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// List the names of existing indexes.
    async fn list_indexes(&self) -> Result<Vec<String>>;

    /// Create a new index.
    async fn create_index(&self, spec: &IndexSpec) -> Result<()>;

    /// Insert or overwrite records by id. Returns the number written.
    async fn upsert(&self, index: &str, records: &[Record]) -> Result<usize>;

    /// Return the `top_k` most similar records, best first, with metadata.
    async fn query(&self, index: &str, vector: &[f32], top_k: usize) -> Result<Vec<Match>>;

    /// Delete records by id. Unknown ids are ignored.
    async fn delete(&self, index: &str, ids: &[String]) -> Result<()>;

    /// Return every record in the index.
    async fn list_records(&self, index: &str) -> Result<Vec<Record>>;

    /// Describe an index.
    async fn describe_index_stats(&self, index: &str) -> Result<IndexStats>;
}

/// Create any of `names` that do not exist yet. Returns the created names.
pub async fn ensure_indexes(
    store: &dyn VectorStore,
    names: &[String],
    dimension: usize,
    metric: Metric,
) -> Result<Vec<String>> {
    let existing = store.list_indexes().await?;
    let mut created = Vec::new();

    for name in names {
        if existing.iter().any(|e| e == name) {
            continue;
        }
        info!("Creating index {} ({} dims, {})", name, dimension, metric);
        store
            .create_index(&IndexSpec {
                name: name.clone(),
                dimension,
                metric,
            })
            .await?;
        created.push(name.clone());
    }

    Ok(created)
}

/// Build the vector store selected in settings.
pub fn create_vector_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    match settings.vector_store.provider.to_lowercase().as_str() {
        "pinecone" => Ok(Arc::new(PineconeVectorStore::from_settings(
            &settings.vector_store,
        )?)),
        "sqlite" => Ok(Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?)),
        "memory" => Ok(Arc::new(MemoryVectorStore::new())),
        other => Err(ShoptalkError::Config(format!(
            "Unknown vector store provider: {}",
            other
        ))),
    }
}

/// Read a string metadata field.
pub fn metadata_str<'a>(metadata: &'a Metadata, key: &str) -> Option<&'a str> {
    metadata.get(key).and_then(|v| v.as_str())
}

pub(crate) fn check_dimension(index: &str, expected: usize, values: &[f32]) -> Result<()> {
    if values.len() != expected {
        return Err(ShoptalkError::VectorStore(format!(
            "Vector dimension {} does not match index {} dimension {}",
            values.len(),
            index,
            expected
        )));
    }
    Ok(())
}

pub(crate) fn index_not_found(index: &str) -> ShoptalkError {
    ShoptalkError::VectorStore(format!("Index not found: {}", index))
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
