//! Init command - interactive first-run setup.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use console::style;
use std::io::{self, Write};
use std::path::PathBuf;

/// Run the init command for first-time setup.
pub async fn run_init(settings: &Settings, config_path: Option<&str>) -> anyhow::Result<()> {
    Output::header("Shoptalk Setup");
    println!();

    // Step 1: Check API keys
    println!("{}", style("Step 1: Checking API configuration").bold().cyan());
    println!();

    let mut keys_ready = true;

    if std::env::var("OPENAI_API_KEY").map_or(true, |k| k.is_empty()) {
        keys_ready = false;
        Output::warning("OPENAI_API_KEY environment variable is not set.");
        println!("  Shoptalk uses OpenAI for embeddings and answers.");
        println!("  {}", style("export OPENAI_API_KEY='sk-...'").green());
        println!();
    } else {
        Output::success("OpenAI API key is configured!");
    }

    let uses_pinecone = settings.vector_store.provider.eq_ignore_ascii_case("pinecone");
    if uses_pinecone && settings.vector_store.resolve_api_key().is_none() {
        keys_ready = false;
        Output::warning("No Pinecone API key found.");
        println!("  {}", style("export PINECONE_API_KEY='...'").green());
        println!();
    } else if uses_pinecone {
        Output::success("Pinecone API key is configured!");
    } else {
        Output::info(&format!("Using the {} vector store.", settings.vector_store.provider));
    }

    println!();

    // Step 2: Create directories
    println!("{}", style("Step 2: Setting up directories").bold().cyan());
    println!();

    let data_dir = settings.data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        Output::success(&format!("Created data directory: {}", data_dir.display()));
    } else {
        Output::info(&format!("Data directory exists: {}", data_dir.display()));
    }

    println!();

    // Step 3: Create config file
    println!("{}", style("Step 3: Configuration file").bold().cyan());
    println!();

    let config_path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(Settings::default_config_path);
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    // Step 4: Vector indexes
    println!("{}", style("Step 4: Vector indexes").bold().cyan());
    println!();

    if keys_ready {
        let orchestrator = Orchestrator::new(settings.clone())?;
        let spinner = Output::spinner("Checking indexes...");
        let created = orchestrator.ensure_indexes().await;
        spinner.finish_and_clear();

        let created = created?;
        if created.is_empty() {
            Output::info("All indexes already exist.");
        }
        for name in &created {
            Output::success(&format!("Created index {}", name));
        }
        for name in settings.indexes.all() {
            Output::list_item(&name);
        }
    } else {
        Output::warning("Skipping index creation until API keys are set.");
    }

    println!();
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!(
        "  {} Index a transcript",
        style("shoptalk ingest <file.docx> --index bents").cyan()
    );
    println!("  {} Ask a question", style("shoptalk ask \"<question>\" --index bents").cyan());
    println!("  {} Start the API", style("shoptalk serve").cyan());

    Ok(())
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
