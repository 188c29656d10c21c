//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::document::is_docx_filename;
use crate::orchestrator::Orchestrator;
use anyhow::{bail, Context, Result};

/// Index a local `.docx` transcript.
pub async fn run_ingest(file: &str, index: &str, url: Option<String>, settings: Settings) -> Result<()> {
    if !is_docx_filename(file) {
        bail!("Only .docx transcripts are supported: {}", file);
    }

    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file))?;

    let orchestrator = Orchestrator::new(settings)?;
    let ingestor = orchestrator.ingestor();

    let spinner = Output::spinner(&format!("Indexing {} into {}...", file, index));
    let result = ingestor.ingest(index, &bytes, url).await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            Output::success(&format!("Indexed '{}'", result.title));
            Output::kv("Index", index);
            Output::kv("Chunks", &result.chunks_indexed.to_string());
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to index {}: {}", file, e));
            Err(e.into())
        }
    }
}
