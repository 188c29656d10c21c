//! CLI output formatting utilities.

use crate::catalog::ProductEntry;
use crate::rag::RelatedProduct;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a catalog entry.
    pub fn product(entry: &ProductEntry) {
        println!(
            "  {} {} ({})",
            style("*").cyan(),
            style(&entry.title).bold(),
            style(&entry.id).dim()
        );
        println!("    tags: {}", entry.tags);
        println!("    {}", style(&entry.link).dim());
    }

    /// Print a product recommended with an answer.
    pub fn related_product(product: &RelatedProduct) {
        println!(
            "  {} {} [{}]",
            style("*").cyan(),
            style(&product.title).bold(),
            product.tags
        );
        if !product.link.is_empty() {
            println!("    {}", style(&product.link).dim());
        }
    }

    /// Print a retrieved transcript excerpt.
    pub fn source(index: usize, content: &str) {
        println!(
            "\n{} {}",
            style(format!("[{}]", index + 1)).green(),
            content_preview(content, 200)
        );
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(spinner_style);
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis, on a character boundary.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
