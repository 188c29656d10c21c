//! Configuration module for Shoptalk.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, ContactSettings, EmbeddingSettings, GeneralSettings, IndexSettings, PromptSettings,
    RagSettings, ServerSettings, Settings, VectorStoreSettings,
};
