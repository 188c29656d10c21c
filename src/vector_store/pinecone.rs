//! Pinecone vector store over the REST API.
//!
//! Index management goes through the control plane (`api_url`); record
//! operations go to each index's own data-plane host, which is looked up once
//! per index and cached.

use super::{IndexSpec, IndexStats, Match, Metadata, Record, VectorStore};
use crate::config::VectorStoreSettings;
use crate::error::{Result, ShoptalkError};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info, instrument};

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Records per upsert request.
const UPSERT_BATCH_SIZE: usize = 100;

/// Ids per fetch request (ids travel in the query string).
const FETCH_BATCH_SIZE: usize = 100;

/// Page size for listing ids.
const LIST_PAGE_SIZE: usize = 100;

/// Pinecone-backed vector store.
pub struct PineconeVectorStore {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
    api_version: String,
    cloud: String,
    region: String,
    hosts: RwLock<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Deserialize)]
struct IndexDescription {
    name: String,
    #[serde(default)]
    host: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    vectors: Vec<ListedId>,
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct ListedId {
    id: String,
}

#[derive(Deserialize)]
struct Pagination {
    next: Option<String>,
}

#[derive(Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, FetchedVector>,
}

#[derive(Deserialize)]
struct FetchedVector {
    id: String,
    #[serde(default)]
    values: Vec<f32>,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    total_vector_count: usize,
}

impl PineconeVectorStore {
    /// Create a store talking to the given control plane.
    pub fn new(api_key: &str, api_url: &str, api_version: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ShoptalkError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            hosts: RwLock::new(HashMap::new()),
        })
    }

    /// Create a store from settings. Requires an API key.
    pub fn from_settings(settings: &VectorStoreSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key().ok_or_else(|| {
            ShoptalkError::Config(
                "PINECONE_API_KEY not set. Set it with: export PINECONE_API_KEY='...'".to_string(),
            )
        })?;

        let mut store = Self::new(&api_key, &settings.api_url, &settings.api_version)?;
        store.cloud = settings.cloud.clone();
        store.region = settings.region.clone();
        Ok(store)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        builder: RequestBuilder,
    ) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShoptalkError::VectorStore(format!(
                "Pinecone {} failed ({}): {}",
                operation, status, body
            )));
        }

        // Some endpoints reply with an empty body
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_value(json!({}))?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Resolve the data-plane base URL of an index.
    async fn host(&self, index: &str) -> Result<String> {
        if let Some(host) = self.cached_host(index)? {
            return Ok(host);
        }

        let url = format!("{}/indexes/{}", self.api_url, index);
        let response = self.request(Method::GET, &url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(super::index_not_found(index));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ShoptalkError::VectorStore(format!(
                "Pinecone describe index failed ({}): {}",
                status, body
            )));
        }

        let description: IndexDescription = response.json().await?;
        if description.host.is_empty() {
            return Err(ShoptalkError::VectorStore(format!(
                "Index {} has no host yet",
                description.name
            )));
        }

        let base = normalize_host(&description.host);
        debug!("Resolved host for {}: {}", index, base);

        self.hosts
            .write()
            .map_err(|e| ShoptalkError::VectorStore(format!("Failed to acquire lock: {}", e)))?
            .insert(index.to_string(), base.clone());

        Ok(base)
    }

    fn cached_host(&self, index: &str) -> Result<Option<String>> {
        Ok(self
            .hosts
            .read()
            .map_err(|e| ShoptalkError::VectorStore(format!("Failed to acquire lock: {}", e)))?
            .get(index)
            .cloned())
    }

    async fn list_ids(&self, host: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut params = vec![("limit".to_string(), LIST_PAGE_SIZE.to_string())];
            if let Some(t) = &token {
                params.push(("paginationToken".to_string(), t.clone()));
            }

            let page: ListResponse = self
                .send(
                    "list",
                    self.request(Method::GET, &format!("{}/vectors/list", host))
                        .query(&params),
                )
                .await?;

            ids.extend(page.vectors.into_iter().map(|v| v.id));

            token = page.pagination.and_then(|p| p.next).filter(|t| !t.is_empty());
            if token.is_none() {
                break;
            }
        }

        Ok(ids)
    }
}

/// Data-plane hosts come back without a scheme.
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[async_trait]
impl VectorStore for PineconeVectorStore {
    async fn list_indexes(&self) -> Result<Vec<String>> {
        let list: IndexList = self
            .send(
                "list indexes",
                self.request(Method::GET, &format!("{}/indexes", self.api_url)),
            )
            .await?;
        Ok(list.indexes.into_iter().map(|i| i.name).collect())
    }

    #[instrument(skip(self, spec), fields(index = %spec.name))]
    async fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        let body = json!({
            "name": spec.name,
            "dimension": spec.dimension,
            "metric": spec.metric.to_string(),
            "spec": {
                "serverless": {
                    "cloud": self.cloud,
                    "region": self.region,
                }
            }
        });

        let _: serde_json::Value = self
            .send(
                "create index",
                self.request(Method::POST, &format!("{}/indexes", self.api_url))
                    .json(&body),
            )
            .await?;

        info!("Created Pinecone index {}", spec.name);
        Ok(())
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert(&self, index: &str, records: &[Record]) -> Result<usize> {
        let host = self.host(index).await?;
        let mut total = 0;

        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            let response: UpsertResponse = self
                .send(
                    "upsert",
                    self.request(Method::POST, &format!("{}/vectors/upsert", host))
                        .json(&json!({ "vectors": batch })),
                )
                .await?;
            total += response.upserted_count;
        }

        debug!("Upserted {} records into {}", total, index);
        Ok(total)
    }

    #[instrument(skip(self, vector))]
    async fn query(&self, index: &str, vector: &[f32], top_k: usize) -> Result<Vec<Match>> {
        let host = self.host(index).await?;
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
        };

        let response: QueryResponse = self
            .send(
                "query",
                self.request(Method::POST, &format!("{}/query", host)).json(&body),
            )
            .await?;

        debug!("Query on {} returned {} matches", index, response.matches.len());
        Ok(response.matches)
    }

    async fn delete(&self, index: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let host = self.host(index).await?;
        let _: serde_json::Value = self
            .send(
                "delete",
                self.request(Method::POST, &format!("{}/vectors/delete", host))
                    .json(&json!({ "ids": ids })),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_records(&self, index: &str) -> Result<Vec<Record>> {
        let host = self.host(index).await?;
        let ids = self.list_ids(&host).await?;
        let mut records = Vec::with_capacity(ids.len());

        for batch in ids.chunks(FETCH_BATCH_SIZE) {
            let params: Vec<(&str, &str)> = batch.iter().map(|id| ("ids", id.as_str())).collect();
            let mut response: FetchResponse = self
                .send(
                    "fetch",
                    self.request(Method::GET, &format!("{}/vectors/fetch", host))
                        .query(&params),
                )
                .await?;

            // Keep listing order; fetch returns a map
            for id in batch {
                if let Some(v) = response.vectors.remove(id) {
                    records.push(Record {
                        id: v.id,
                        values: v.values,
                        metadata: v.metadata,
                    });
                }
            }
        }

        Ok(records)
    }

    async fn describe_index_stats(&self, index: &str) -> Result<IndexStats> {
        let host = self.host(index).await?;
        let stats: StatsResponse = self
            .send(
                "describe index stats",
                self.request(Method::POST, &format!("{}/describe_index_stats", host))
                    .json(&json!({})),
            )
            .await?;

        Ok(IndexStats {
            dimension: stats.dimension,
            total_vector_count: stats.total_vector_count,
        })
    }
}
