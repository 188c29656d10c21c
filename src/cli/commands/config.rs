//! Config command implementation.

use crate::cli::ConfigAction;
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: Option<&str>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let mut shown = settings;
            // Never echo secrets
            if shown.vector_store.api_key.is_some() {
                shown.vector_store.api_key = Some("********".to_string());
            }
            let toml_str = toml::to_string_pretty(&shown)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            let path = config_path
                .map(std::path::PathBuf::from)
                .unwrap_or_else(Settings::default_config_path);
            println!("{}", path.display());
        }
    }

    Ok(())
}
