//! Error types for Shoptalk.

use thiserror::Error;

/// Library-level error type for Shoptalk operations.
#[derive(Error, Debug)]
pub enum ShoptalkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Invalid timestamp format: {0}")]
    TimestampFormat(String),

    #[error("Invalid index name: {0}")]
    InvalidIndex(String),

    #[error("Contact store error: {0}")]
    Contact(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

/// Result type alias for Shoptalk operations.
pub type Result<T> = std::result::Result<T, ShoptalkError>;
