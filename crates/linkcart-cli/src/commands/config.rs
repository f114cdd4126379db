//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use linkcart_core::{Config, ImportPolicy, TagPolicy};

use crate::output::{Output, OutputFormat};

const VALID_KEYS: &str =
    "data_dir, resolve_titles, resolve_timeout_secs, user_agent, tag_policy, import_policy, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "links_file": config.links_path(),
                    "resolve_titles": config.resolve_titles,
                    "resolve_timeout_secs": config.resolve_timeout_secs,
                    "user_agent": config.user_agent,
                    "tag_policy": config.tag_policy,
                    "import_policy": config.import_policy,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:             {}", config.data_dir.display());
            println!("  resolve_titles:       {}", config.resolve_titles);
            println!("  resolve_timeout_secs: {}", config.resolve_timeout_secs);
            println!("  user_agent:           {}", config.user_agent);
            println!("  tag_policy:           {}", config.tag_policy);
            println!("  import_policy:        {}", config.import_policy);
            println!(
                "  log_file:             {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
            println!("Links file:  {}", config.links_path().display());
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
    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);

    // Env overrides are per-run and must not end up in the file
    let mut config = Config::load_file(&save_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

/// Validate `value` and store it under `key`
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            if value.is_empty() {
                bail!("data_dir cannot be empty");
            }
            config.data_dir = value.into();
        }
        "resolve_titles" => {
            config.resolve_titles = value
                .parse()
                .context("Invalid value for resolve_titles. Use 'true' or 'false'.")?;
        }
        "resolve_timeout_secs" => {
            config.resolve_timeout_secs = value
                .parse()
                .context("Invalid value for resolve_timeout_secs. Use a whole number of seconds.")?;
        }
        "user_agent" => {
            if value.trim().is_empty() {
                bail!("user_agent cannot be empty");
            }
            config.user_agent = value.to_string();
        }
        "tag_policy" => {
            config.tag_policy = value.parse::<TagPolicy>().map_err(anyhow::Error::msg)?;
        }
        "import_policy" => {
            config.import_policy = value.parse::<ImportPolicy>().map_err(anyhow::Error::msg)?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                VALID_KEYS
            );
        }
    }
    Ok(())
}
