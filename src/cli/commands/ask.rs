//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::ChatRequest;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, index: &str, show_context: bool, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let engine = orchestrator.chat_engine();

    let request = ChatRequest {
        message: question.to_string(),
        selected_index: index.to_string(),
        chat_history: Vec::new(),
    };

    let spinner = Output::spinner("Searching transcripts...");

    match engine.chat(&request).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.response);

            if !response.video_links.is_empty() {
                Output::header("Video links");
                for (placeholder, url) in response.video_links.iter() {
                    Output::kv(placeholder, url);
                }
            }

            if show_context && !response.context.is_empty() {
                Output::header("Sources");
                for (i, text) in response.context.iter().enumerate() {
                    Output::source(i, text);
                }
            }

            if !response.related_products.is_empty() {
                Output::header("Related products");
                for product in &response.related_products {
                    Output::related_product(product);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
