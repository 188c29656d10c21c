//! Transcript ingestion: `.docx` upload to indexed chunks.

use crate::chunking::{create_chunker, ChunkingConfig, ChunkingStrategy, ContentChunk};
use crate::config::{ChunkingSettings, IndexSettings};
use crate::document::{extract_docx_text, TranscriptMetadata};
use crate::embedding::Embedder;
use crate::error::{Result, ShoptalkError};
use crate::vector_store::{Metadata, Record, VectorStore};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Result of ingesting one transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestResult {
    /// Title read from the transcript.
    pub title: String,
    /// Number of chunks written to the index.
    pub chunks_indexed: usize,
}

/// Splits transcripts into chunks and writes them to a transcript index.
pub struct TranscriptIngestor {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    indexes: IndexSettings,
    chunking: ChunkingSettings,
}

impl TranscriptIngestor {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        indexes: IndexSettings,
        chunking: ChunkingSettings,
    ) -> Self {
        Self {
            vector_store,
            embedder,
            indexes,
            chunking,
        }
    }

    /// Ingest a `.docx` transcript into `index`.
    ///
    /// `url` overrides any video URL found in the transcript header.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn ingest(&self, index: &str, bytes: &[u8], url: Option<String>) -> Result<IngestResult> {
        if !self.indexes.is_transcript_index(index) {
            return Err(ShoptalkError::InvalidIndex(index.to_string()));
        }

        let text = extract_docx_text(bytes)?;
        self.ingest_text(index, &text, url).await
    }

    /// Ingest already-extracted transcript text.
    pub async fn ingest_text(&self, index: &str, text: &str, url: Option<String>) -> Result<IngestResult> {
        if !self.indexes.is_transcript_index(index) {
            return Err(ShoptalkError::InvalidIndex(index.to_string()));
        }

        let metadata = TranscriptMetadata::from_text(text).with_url(url);
        info!("Ingesting '{}' into {}", metadata.title, index);

        let chunks = self.chunk(text)?;
        info!("Created {} chunks", chunks.len());

        let chunks_indexed = self.index_chunks(index, &metadata, chunks).await?;

        Ok(IngestResult {
            title: metadata.title,
            chunks_indexed,
        })
    }

    fn chunk(&self, text: &str) -> Result<Vec<ContentChunk>> {
        let strategy: ChunkingStrategy = self.chunking.strategy.parse().unwrap_or_else(|e| {
            warn!("{}, using recursive", e);
            ChunkingStrategy::Recursive
        });
        let config = ChunkingConfig::from_settings(&self.chunking)?;

        Ok(create_chunker(strategy).chunk(text, &config))
    }

    /// Generate embeddings and index chunks.
    async fn index_chunks(
        &self,
        index: &str,
        metadata: &TranscriptMetadata,
        chunks: Vec<ContentChunk>,
    ) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(ShoptalkError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let url = metadata.url.clone().unwrap_or_default();
        let records: Vec<Record> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                // Re-uploading a transcript overwrites its chunks in place
                let chunk_id = format!("{}_chunk_{}", metadata.title, chunk.order);

                let mut fields = Metadata::new();
                fields.insert("title".to_string(), Value::from(metadata.title.as_str()));
                fields.insert("chunk_id".to_string(), Value::from(chunk_id.as_str()));
                fields.insert("url".to_string(), Value::from(url.as_str()));
                fields.insert("text".to_string(), Value::from(chunk.content));

                Record::new(record_id(&chunk_id), embedding, fields)
            })
            .collect();

        self.vector_store.upsert(index, &records).await
    }
}

/// Stable ASCII record id for a chunk.
///
/// Titles may hold any characters, which some vector stores reject in ids.
fn record_id(chunk_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::docx_from_lines;
    use crate::vector_store::{metadata_str, IndexSpec, MemoryVectorStore, Metric};
    use async_trait::async_trait;

    struct ConstantEmbedder;

    #[async_trait]
    impl Embedder for ConstantEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    async fn ingestor(chunk_size: usize, chunk_overlap: usize) -> (TranscriptIngestor, Arc<MemoryVectorStore>) {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .create_index(&IndexSpec {
                name: "bents".to_string(),
                dimension: 2,
                metric: Metric::Cosine,
            })
            .await
            .unwrap();

        let chunking = ChunkingSettings {
            chunk_size,
            chunk_overlap,
            ..ChunkingSettings::default()
        };
        let ingestor = TranscriptIngestor::new(
            store.clone(),
            Arc::new(ConstantEmbedder),
            IndexSettings::default(),
            chunking,
        );
        (ingestor, store)
    }

    #[tokio::test]
    async fn test_ingest_docx() {
        let (ingestor, store) = ingestor(40, 10).await;
        let bytes = docx_from_lines(&[
            "Building a Workbench",
            "https://www.youtube.com/watch?v=bench",
            "Today we flatten the top with a router sled and some patience.",
            "Then we cut the dog holes along the front edge.",
        ]);

        let result = ingestor.ingest("bents", &bytes, None).await.unwrap();
        assert_eq!(result.title, "Building a Workbench");
        assert!(result.chunks_indexed > 1);

        let records = store.list_records("bents").await.unwrap();
        assert_eq!(records.len(), result.chunks_indexed);
        assert_eq!(records[0].id, record_id("Building a Workbench_chunk_0"));
        assert_eq!(metadata_str(&records[0].metadata, "chunk_id"), Some("Building a Workbench_chunk_0"));
        assert_eq!(
            metadata_str(&records[1].metadata, "url"),
            Some("https://www.youtube.com/watch?v=bench")
        );
        assert!(records
            .iter()
            .all(|r| metadata_str(&r.metadata, "text").is_some_and(|t| t.chars().count() <= 40)));
    }

    #[tokio::test]
    async fn test_url_override_and_reupload() {
        let (ingestor, store) = ingestor(1000, 200).await;
        let bytes = docx_from_lines(&["Sharpening", "Hone the bevel first."]);

        ingestor
            .ingest("bents", &bytes, Some("https://youtu.be/sharp".to_string()))
            .await
            .unwrap();
        ingestor
            .ingest("bents", &bytes, Some("https://youtu.be/sharp".to_string()))
            .await
            .unwrap();

        let records = store.list_records("bents").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(metadata_str(&records[0].metadata, "url"), Some("https://youtu.be/sharp"));
    }

    #[tokio::test]
    async fn test_non_ascii_title_gets_ascii_ids() {
        let (ingestor, store) = ingestor(1000, 200).await;
        let bytes = docx_from_lines(&["Café Table – Part 1", "Plane the apron square."]);

        ingestor.ingest("bents", &bytes, None).await.unwrap();
        ingestor.ingest("bents", &bytes, None).await.unwrap();

        let records = store.list_records("bents").await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].id.is_ascii());
        assert!(Uuid::parse_str(&records[0].id).is_ok());
        assert_eq!(
            metadata_str(&records[0].metadata, "chunk_id"),
            Some("Café Table – Part 1_chunk_0")
        );
        assert_eq!(metadata_str(&records[0].metadata, "title"), Some("Café Table – Part 1"));
    }

    /// Drops the last embedding of every batch.
    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn test_embedding_count_mismatch_indexes_nothing() {
        let (_, store) = ingestor(1000, 200).await;
        let ingestor = TranscriptIngestor::new(
            store.clone(),
            Arc::new(ShortEmbedder),
            IndexSettings::default(),
            ChunkingSettings::default(),
        );

        let err = ingestor
            .ingest_text("bents", "Sharpening\nHone the bevel first.", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ShoptalkError::Embedding(_)));
        assert!(store.list_records("bents").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unknown_index_and_bad_file() {
        let (ingestor, _) = ingestor(1000, 200).await;
        let bytes = docx_from_lines(&["Title"]);

        let err = ingestor.ingest("products", &bytes, None).await.unwrap_err();
        assert!(matches!(err, ShoptalkError::InvalidIndex(_)));

        let err = ingestor.ingest("bents", b"not a zip", None).await.unwrap_err();
        assert!(matches!(err, ShoptalkError::Document(_)));
    }

    #[tokio::test]
    async fn test_empty_document_indexes_nothing() {
        let (ingestor, store) = ingestor(1000, 200).await;
        let result = ingestor.ingest_text("bents", "", None).await.unwrap();

        assert_eq!(result.title, "Untitled Video");
        assert_eq!(result.chunks_indexed, 0);
        assert!(store.list_records("bents").await.unwrap().is_empty());
    }
}
