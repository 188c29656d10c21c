//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{
    check_dimension, index_not_found, IndexSpec, IndexStats, Match, Record, VectorStore,
};
use crate::error::{Result, ShoptalkError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

struct MemoryIndex {
    spec: IndexSpec,
    /// Records in insertion order.
    records: Vec<Record>,
}

/// In-memory vector store.
pub struct MemoryVectorStore {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            indexes: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, MemoryIndex>>> {
        self.indexes
            .read()
            .map_err(|e| ShoptalkError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, MemoryIndex>>> {
        self.indexes
            .write()
            .map_err(|e| ShoptalkError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn list_indexes(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        let mut indexes = self.write()?;
        if indexes.contains_key(&spec.name) {
            return Err(ShoptalkError::VectorStore(format!(
                "Index already exists: {}",
                spec.name
            )));
        }
        indexes.insert(
            spec.name.clone(),
            MemoryIndex {
                spec: spec.clone(),
                records: Vec::new(),
            },
        );
        Ok(())
    }

    async fn upsert(&self, index: &str, records: &[Record]) -> Result<usize> {
        let mut indexes = self.write()?;
        let idx = indexes.get_mut(index).ok_or_else(|| index_not_found(index))?;

        for record in records {
            check_dimension(index, idx.spec.dimension, &record.values)?;
        }

        for record in records {
            match idx.records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => idx.records.push(record.clone()),
            }
        }
        Ok(records.len())
    }

    async fn query(&self, index: &str, vector: &[f32], top_k: usize) -> Result<Vec<Match>> {
        let indexes = self.read()?;
        let idx = indexes.get(index).ok_or_else(|| index_not_found(index))?;
        check_dimension(index, idx.spec.dimension, vector)?;

        let mut matches: Vec<Match> = idx
            .records
            .iter()
            .map(|r| Match {
                id: r.id.clone(),
                score: idx.spec.metric.score(vector, &r.values),
                metadata: r.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);

        Ok(matches)
    }

    async fn delete(&self, index: &str, ids: &[String]) -> Result<()> {
        let mut indexes = self.write()?;
        let idx = indexes.get_mut(index).ok_or_else(|| index_not_found(index))?;
        idx.records.retain(|r| !ids.contains(&r.id));
        Ok(())
    }

    async fn list_records(&self, index: &str) -> Result<Vec<Record>> {
        let indexes = self.read()?;
        let idx = indexes.get(index).ok_or_else(|| index_not_found(index))?;
        Ok(idx.records.clone())
    }

    async fn describe_index_stats(&self, index: &str) -> Result<IndexStats> {
        let indexes = self.read()?;
        let idx = indexes.get(index).ok_or_else(|| index_not_found(index))?;
        Ok(IndexStats {
            dimension: idx.spec.dimension,
            total_vector_count: idx.records.len(),
        })
    }
}
