//! Service wiring for Shoptalk.
//!
//! Builds the embedder, chat model and vector store from settings and hands
//! out the services that share them.

use crate::catalog::ProductCatalog;
use crate::config::{Prompts, Settings};
use crate::contact::ContactStore;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, ShoptalkError};
use crate::ingest::TranscriptIngestor;
use crate::llm::{ChatModel, OpenAIChatModel};
use crate::rag::ChatEngine;
use crate::server::AppState;
use crate::vector_store::{create_vector_store, ensure_indexes, Metric, VectorStore};
use std::sync::Arc;
use tracing::info;

/// Owns the shared clients and builds services on top of them.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn ChatModel>,
    vector_store: Arc<dyn VectorStore>,
    contacts: Arc<ContactStore>,
}

impl Orchestrator {
    /// Create an orchestrator with clients configured from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        // Load prompts (with optional custom directory and variables)
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
        let model = Arc::new(OpenAIChatModel::from_settings(&settings.rag)?);
        let vector_store = create_vector_store(&settings)?;
        let contacts = Arc::new(ContactStore::new(&settings.contacts_path())?);

        info!(
            "Using {} vector store, {} for answers, {} for embeddings",
            settings.vector_store.provider, settings.rag.model, settings.embedding.model
        );

        Ok(Self {
            settings,
            prompts,
            embedder,
            model,
            vector_store,
            contacts,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn ChatModel>,
        vector_store: Arc<dyn VectorStore>,
        contacts: Arc<ContactStore>,
    ) -> Self {
        Self {
            settings,
            prompts,
            embedder,
            model,
            vector_store,
            contacts,
        }
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Chat engine over the transcript indexes.
    pub fn chat_engine(&self) -> ChatEngine {
        ChatEngine::new(
            self.embedder.clone(),
            self.model.clone(),
            self.vector_store.clone(),
            self.settings.indexes.clone(),
            self.settings.rag.clone(),
        )
        .with_prompts(self.prompts.clone())
    }

    /// Product catalog over the product index.
    pub fn catalog(&self) -> ProductCatalog {
        ProductCatalog::new(
            self.vector_store.clone(),
            self.embedder.clone(),
            self.settings.indexes.products.clone(),
        )
    }

    /// Transcript ingestor.
    pub fn ingestor(&self) -> TranscriptIngestor {
        TranscriptIngestor::new(
            self.vector_store.clone(),
            self.embedder.clone(),
            self.settings.indexes.clone(),
            self.settings.chunking.clone(),
        )
    }

    /// State for the HTTP API.
    pub fn app_state(&self) -> AppState {
        AppState {
            chat: self.chat_engine(),
            catalog: self.catalog(),
            ingestor: self.ingestor(),
            contacts: self.contacts.clone(),
            indexes: self.settings.indexes.clone(),
            server: self.settings.server.clone(),
        }
    }

    /// Create any configured index that does not exist yet.
    pub async fn ensure_indexes(&self) -> Result<Vec<String>> {
        let metric: Metric = self
            .settings
            .vector_store
            .metric
            .parse()
            .map_err(ShoptalkError::Config)?;

        ensure_indexes(
            self.vector_store.as_ref(),
            &self.settings.indexes.all(),
            self.embedder.dimensions(),
            metric,
        )
        .await
    }
}
