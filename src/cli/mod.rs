//! CLI module for Shoptalk.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Shoptalk - Q&A over woodworking video transcripts
///
/// Serves the chat and catalog API, and manages transcripts and products from the shell.
#[derive(Parser, Debug)]
#[command(name = "shoptalk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default config and create missing vector indexes
    Init,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Index a .docx transcript
    Ingest {
        /// Path to the .docx file
        file: String,

        /// Transcript index to write to
        #[arg(short, long)]
        index: String,

        /// Video URL (overrides any URL in the transcript header)
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Ask a question against a transcript index
    Ask {
        /// The question to ask
        question: String,

        /// Transcript index to search
        #[arg(short, long)]
        index: String,

        /// Print the retrieved transcript excerpts
        #[arg(long)]
        show_context: bool,
    },

    /// Manage the product catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProductAction {
    /// List all products
    List,

    /// Add a product
    Add {
        /// Product title
        title: String,

        /// Comma-separated tags
        #[arg(short, long)]
        tags: String,

        /// Product link
        #[arg(short, long)]
        link: String,
    },

    /// Delete a product
    Delete {
        /// Product id
        id: String,
    },

    /// Replace a product (it gets a new id)
    Update {
        /// Product id
        id: String,

        /// Product title
        title: String,

        /// Comma-separated tags
        #[arg(short, long)]
        tags: String,

        /// Product link
        #[arg(short, long)]
        link: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
