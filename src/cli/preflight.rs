//! Pre-flight checks before commands that talk to remote services.
//!
//! Validates that API keys are available before starting operations that
//! would otherwise fail on the first request.

use crate::config::Settings;
use crate::error::{Result, ShoptalkError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Serving needs every backend.
    Serve,
    /// Ingestion embeds chunks and writes to the vector store.
    Ingest,
    /// Asking embeds, generates and queries.
    Ask,
    /// Catalog edits embed tags and write to the vector store.
    Products,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Serve | Operation::Ingest | Operation::Ask | Operation::Products => {
            check_openai_key()?;
            check_vector_store(settings)?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_openai_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(ShoptalkError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(ShoptalkError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check that the selected vector store can be reached with the given config.
fn check_vector_store(settings: &Settings) -> Result<()> {
    if !settings.vector_store.provider.eq_ignore_ascii_case("pinecone") {
        return Ok(());
    }

    match settings.vector_store.resolve_api_key() {
        Some(_) => Ok(()),
        None => Err(ShoptalkError::Config(
            "Pinecone API key not set. Set PINECONE_API_KEY or vector_store.api_key".to_string(),
        )),
    }
}
