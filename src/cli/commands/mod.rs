//! CLI command implementations.

mod ask;
mod config;
mod ingest;
mod init;
mod products;
mod serve;

pub use ask::run_ask;
pub use config::run_config;
pub use ingest::run_ingest;
pub use init::run_init;
pub use products::run_products;
pub use serve::run_serve;
