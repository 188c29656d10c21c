//! Product catalog commands.

use crate::catalog::parse_tags;
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, ProductAction};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run a product catalog command.
pub async fn run_products(action: &ProductAction, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Products, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let catalog = orchestrator.catalog();

    match action {
        ProductAction::List => {
            let products = catalog.list().await?;
            if products.is_empty() {
                Output::info("No products yet. Use 'shoptalk products add' to create one.");
            } else {
                Output::header(&format!("Products ({})", products.len()));
                println!();
                for product in &products {
                    Output::product(product);
                }
            }
        }

        ProductAction::Add { title, tags, link } => {
            let id = catalog.add(title, &parse_tags(tags), link).await?;
            Output::success(&format!("Added '{}'", title));
            Output::kv("Id", &id);
        }

        ProductAction::Delete { id } => {
            catalog.delete(id).await?;
            Output::success(&format!("Deleted {}", id));
        }

        ProductAction::Update {
            id,
            title,
            tags,
            link,
        } => {
            let new_id = catalog.update(id, title, &parse_tags(tags), link).await?;
            Output::success(&format!("Updated '{}'", title));
            Output::kv("New id", &new_id);
        }
    }

    Ok(())
}
