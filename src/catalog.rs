//! Product catalog stored in the product vector index.
//!
//! Each product is embedded by its tag text so that answers mentioning the
//! same things land near it.

use crate::embedding::Embedder;
use crate::error::{Result, ShoptalkError};
use crate::vector_store::{metadata_str, Metadata, Record, VectorStore};
use serde::ser::{Serialize, SerializeTuple, Serializer};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// A product as listed by the admin UI.
///
/// Serializes as `[id, title, tags, link, image_url]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductEntry {
    pub id: String,
    pub title: String,
    pub tags: String,
    pub link: String,
    /// `data:` URL built from stored base64 JPEG data, or empty.
    pub image_url: String,
}

impl ProductEntry {
    fn from_record(record: &Record) -> Self {
        let metadata = &record.metadata;
        let image_url = match metadata_str(metadata, "image_data") {
            Some(data) if !data.is_empty() => format!("data:image/jpeg;base64,{}", data),
            _ => String::new(),
        };

        Self {
            id: record.id.clone(),
            title: metadata_str(metadata, "title").unwrap_or("No Title").to_string(),
            tags: metadata_str(metadata, "tags").unwrap_or("No Tags").to_string(),
            link: metadata_str(metadata, "link").unwrap_or("No Link").to_string(),
            image_url,
        }
    }
}

impl Serialize for ProductEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(5)?;
        tuple.serialize_element(&self.id)?;
        tuple.serialize_element(&self.title)?;
        tuple.serialize_element(&self.tags)?;
        tuple.serialize_element(&self.link)?;
        tuple.serialize_element(&self.image_url)?;
        tuple.end()
    }
}

/// Split a comma-separated tag string, trimming and dropping empties.
pub fn parse_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// CRUD over the product index.
pub struct ProductCatalog {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    index: String,
}

impl ProductCatalog {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        index: impl Into<String>,
    ) -> Self {
        Self {
            vector_store,
            embedder,
            index: index.into(),
        }
    }

    /// Add a product and return its generated id.
    #[instrument(skip(self))]
    pub async fn add(&self, title: &str, tags: &[String], link: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let tags_text = tags.join(", ");

        let embedding = self.embedder.embed(&tags_text).await?;

        let mut metadata = Metadata::new();
        metadata.insert("title".to_string(), Value::from(title));
        metadata.insert("tags".to_string(), Value::from(tags_text.as_str()));
        metadata.insert("link".to_string(), Value::from(link));
        metadata.insert("text".to_string(), Value::from(tags_text.as_str()));

        self.vector_store
            .upsert(&self.index, &[Record::new(id.clone(), embedding, metadata)])
            .await?;

        info!("Added product {} ({})", title, id);
        Ok(id)
    }

    /// Remove a product. Unknown ids are not an error.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(ShoptalkError::InvalidInput("Product id is empty".to_string()));
        }
        self.vector_store
            .delete(&self.index, &[id.to_string()])
            .await?;
        info!("Deleted product {}", id);
        Ok(())
    }

    /// Replace a product. The replacement gets a fresh id, which is returned.
    pub async fn update(&self, id: &str, title: &str, tags: &[String], link: &str) -> Result<String> {
        self.delete(id).await?;
        self.add(title, tags, link).await
    }

    /// List every product in the index.
    pub async fn list(&self) -> Result<Vec<ProductEntry>> {
        let records = self.vector_store.list_records(&self.index).await?;
        debug!("Listed {} products from {}", records.len(), self.index);
        Ok(records.iter().map(ProductEntry::from_record).collect())
    }
}
