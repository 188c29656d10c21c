//! RAG (Retrieval-Augmented Generation) for question answering over transcripts.
//!
//! Retrieval and generation live in [`ChatEngine`]; the answer post-processing
//! steps (timestamp links, product ordering) are plain functions so they can be
//! used and tested on their own.

pub mod context;
mod engine;
pub mod history;
pub mod products;
pub mod timestamps;

pub use context::SourceChunk;
pub use engine::{ChatEngine, ChatRequest, ChatResponse};
pub use history::ChatHistory;
pub use products::{partition_products, RelatedProduct};
pub use timestamps::{combine_url_and_timestamp, process_answer, ProcessedAnswer, VideoLinks};
