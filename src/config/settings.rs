//! Configuration settings for Shoptalk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub vector_store: VectorStoreSettings,
    pub indexes: IndexSettings,
    pub rag: RagSettings,
    pub prompts: PromptSettings,
    pub contacts: ContactSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.shoptalk".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Origins allowed by CORS (the web frontend).
    pub cors_origins: Vec<String>,
    /// Maximum accepted request body for document uploads.
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions (must match the vector indexes).
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Chunking strategy (recursive, fixed).
    pub strategy: String,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            strategy: "recursive".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (pinecone, sqlite, memory).
    pub provider: String,
    /// Pinecone API key. Falls back to `PINECONE_API_KEY`.
    pub api_key: Option<String>,
    /// Pinecone control plane URL.
    pub api_url: String,
    /// Pinecone REST API version header.
    pub api_version: String,
    /// Similarity metric for newly created indexes.
    pub metric: String,
    /// Serverless cloud for newly created indexes.
    pub cloud: String,
    /// Serverless region for newly created indexes.
    pub region: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "pinecone".to_string(),
            api_key: None,
            api_url: "https://api.pinecone.io".to_string(),
            api_version: "2024-07".to_string(),
            metric: "cosine".to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            sqlite_path: "~/.shoptalk/vectors.db".to_string(),
        }
    }
}

impl VectorStoreSettings {
    /// Resolve the Pinecone API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("PINECONE_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Names of the vector indexes the service reads and writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Transcript indexes a chat may select from.
    pub transcripts: Vec<String>,
    /// Product catalog index.
    pub products: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            transcripts: vec![
                "bents".to_string(),
                "shop-improvement".to_string(),
                "tool-recommendations".to_string(),
            ],
            products: "bents-woodworking-products".to_string(),
        }
    }
}

impl IndexSettings {
    /// Check whether a transcript index name is known.
    pub fn is_transcript_index(&self, name: &str) -> bool {
        self.transcripts.iter().any(|n| n == name)
    }

    /// All indexes the service needs, transcripts first.
    pub fn all(&self) -> Vec<String> {
        let mut names = self.transcripts.clone();
        names.push(self.products.clone());
        names
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for response generation.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Number of transcript chunks retrieved per question.
    pub top_k: usize,
    /// Number of products retrieved per answer.
    pub product_top_k: usize,
    /// Rewrite follow-up questions into standalone ones before retrieval.
    pub condense_question: bool,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            top_k: 3,
            product_top_k: 5,
            condense_question: true,
        }
    }
}

/// Contact form storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSettings {
    /// Path to the SQLite database holding contact messages.
    pub db_path: String,
}

impl Default for ContactSettings {
    fn default() -> Self {
        Self {
            db_path: "~/.shoptalk/contacts.db".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ShoptalkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shoptalk")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Get the expanded contact database path.
    pub fn contacts_path(&self) -> PathBuf {
        Self::expand_path(&self.contacts.db_path)
    }
}
