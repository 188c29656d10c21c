//! SQLite-based vector store implementation.
//!
//! Uses SQLite with similarity computed in Rust for simplicity. Intended for
//! local development against a realistic persistent store; production
//! deployments use Pinecone.

use super::{
    check_dimension, index_not_found, IndexSpec, IndexStats, Match, Metadata, Metric, Record,
    VectorStore,
};
use crate::error::{Result, ShoptalkError};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS indexes (
        name TEXT PRIMARY KEY,
        dimension INTEGER NOT NULL,
        metric TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS records (
        index_name TEXT NOT NULL REFERENCES indexes(name) ON DELETE CASCADE,
        id TEXT NOT NULL,
        embedding BLOB NOT NULL,
        metadata TEXT NOT NULL,
        PRIMARY KEY (index_name, id)
    );
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Create a new SQLite vector store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ShoptalkError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn index_spec(conn: &Connection, index: &str) -> Result<IndexSpec> {
        let row = conn
            .query_row(
                "SELECT dimension, metric FROM indexes WHERE name = ?1",
                params![index],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let (dimension, metric) = row.ok_or_else(|| index_not_found(index))?;
        let metric: Metric = metric.parse().map_err(ShoptalkError::VectorStore)?;

        Ok(IndexSpec {
            name: index.to_string(),
            dimension: dimension as usize,
            metric,
        })
    }

    fn load_records(conn: &Connection, index: &str) -> Result<Vec<Record>> {
        let mut stmt = conn.prepare(
            "SELECT id, embedding, metadata FROM records WHERE index_name = ?1 ORDER BY rowid",
        )?;

        let rows = stmt.query_map(params![index], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, embedding, metadata) = row?;
            let metadata: Metadata = serde_json::from_str(&metadata)?;
            records.push(Record {
                id,
                values: Self::bytes_to_embedding(&embedding),
                metadata,
            });
        }
        Ok(records)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn list_indexes(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name FROM indexes ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    async fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO indexes (name, dimension, metric) VALUES (?1, ?2, ?3)",
            params![spec.name, spec.dimension as i64, spec.metric.to_string()],
        )?;
        if inserted == 0 {
            return Err(ShoptalkError::VectorStore(format!(
                "Index already exists: {}",
                spec.name
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert(&self, index: &str, records: &[Record]) -> Result<usize> {
        let mut conn = self.lock()?;
        let spec = Self::index_spec(&conn, index)?;
        for record in records {
            check_dimension(index, spec.dimension, &record.values)?;
        }

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO records (index_name, id, embedding, metadata)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (index_name, id) DO UPDATE SET
                    embedding = excluded.embedding,
                    metadata = excluded.metadata
                "#,
            )?;

            for record in records {
                stmt.execute(params![
                    index,
                    record.id,
                    Self::embedding_to_bytes(&record.values),
                    serde_json::to_string(&record.metadata)?,
                ])?;
            }
        }
        tx.commit()?;

        debug!("Upserted {} records into {}", records.len(), index);
        Ok(records.len())
    }

    async fn query(&self, index: &str, vector: &[f32], top_k: usize) -> Result<Vec<Match>> {
        let conn = self.lock()?;
        let spec = Self::index_spec(&conn, index)?;
        check_dimension(index, spec.dimension, vector)?;

        let mut matches: Vec<Match> = Self::load_records(&conn, index)?
            .into_iter()
            .map(|r| Match {
                score: spec.metric.score(vector, &r.values),
                id: r.id,
                metadata: r.metadata,
            })
            .collect();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn delete(&self, index: &str, ids: &[String]) -> Result<()> {
        let mut conn = self.lock()?;
        Self::index_spec(&conn, index)?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM records WHERE index_name = ?1 AND id = ?2")?;
            for id in ids {
                stmt.execute(params![index, id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn list_records(&self, index: &str) -> Result<Vec<Record>> {
        let conn = self.lock()?;
        Self::index_spec(&conn, index)?;
        Self::load_records(&conn, index)
    }

    async fn describe_index_stats(&self, index: &str) -> Result<IndexStats> {
        let conn = self.lock()?;
        let spec = Self::index_spec(&conn, index)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE index_name = ?1",
            params![index],
            |row| row.get(0),
        )?;
        Ok(IndexStats {
            dimension: spec.dimension,
            total_vector_count: count as usize,
        })
    }
}
