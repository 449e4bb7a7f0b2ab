//! Config command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use stash_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "project_id": config.project_id,
                    "api_key": config.api_key.as_ref().map(|_| "(set)"),
                    "emulator_host": config.emulator_host,
                    "collection": config.collection,
                    "user_id": config.user_id,
                    "id_token": config.id_token.as_ref().map(|_| "(set)"),
                    "metadata_endpoint": config.metadata_endpoint,
                    "fetch_timeout_secs": config.fetch_timeout_secs,
                    "log_file": config.log_file,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.project_id.as_deref().unwrap_or(""));
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            let or_unset = |v: &Option<String>| v.clone().unwrap_or_else(|| "(not set)".to_string());
            let secret = |v: &Option<String>| {
                if v.is_some() { "(set)" } else { "(not set)" }.to_string()
            };

            println!("Configuration:");
            println!("  project_id:         {}", or_unset(&config.project_id));
            println!("  api_key:            {}", secret(&config.api_key));
            println!("  emulator_host:      {}", or_unset(&config.emulator_host));
            println!("  collection:         {}", config.collection);
            println!("  user_id:            {}", or_unset(&config.user_id));
            println!("  id_token:           {}", secret(&config.id_token));
            println!("  metadata_endpoint:  {}", or_unset(&config.metadata_endpoint));
            println!("  fetch_timeout_secs: {}", config.fetch_timeout_secs);
            println!(
                "  log_file:           {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    config.set_value(&key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    let shown = if key == "id_token" || key == "api_key" {
        "(hidden)"
    } else {
        value.as_str()
    };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}
