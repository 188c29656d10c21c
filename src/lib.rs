//! Shoptalk - Q&A over woodworking video transcripts
//!
//! A retrieval-augmented chat backend for a woodworking video library, with a
//! product catalog recommended alongside answers.
//!
//! # Overview
//!
//! Shoptalk allows you to:
//! - Index `.docx` video transcripts into named vector indexes
//! - Ask questions and get answers with timestamped video links
//! - Maintain a catalog of products matched against each answer
//! - Store contact form messages
//! - Serve all of it over an HTTP API for the web frontend
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `document` - Transcript text extraction and header metadata
//! - `chunking` - Transcript chunking strategies
//! - `embedding` - Embedding generation
//! - `llm` - Chat-completion models
//! - `vector_store` - Vector index abstraction (Pinecone, SQLite, memory)
//! - `rag` - Chat engine, timestamp links and product ordering
//! - `catalog` - Product catalog
//! - `ingest` - Transcript ingestion
//! - `contact` - Contact form storage
//! - `server` - HTTP API
//! - `orchestrator` - Service wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use shoptalk::config::Settings;
//! use shoptalk::orchestrator::Orchestrator;
//! use shoptalk::rag::ChatRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let request = ChatRequest {
//!         message: "How do I flatten a workbench top?".to_string(),
//!         selected_index: "bents".to_string(),
//!         chat_history: Vec::new(),
//!     };
//!     let response = orchestrator.chat_engine().chat(&request).await?;
//!     println!("{}", response.response);
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod contact;
pub mod document;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod server;
pub mod vector_store;

pub use error::{Result, ShoptalkError};
