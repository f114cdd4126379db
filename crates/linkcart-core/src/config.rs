//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/linkcart/config.toml)
//! 3. Environment variables (LINKCART_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::TagPolicy;
use crate::resolver::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::transfer::ImportPolicy;

/// Environment variable prefix
const ENV_PREFIX: &str = "LINKCART";

/// File holding the saved collection, inside `data_dir`
const LINKS_FILE: &str = "links.json";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Fetch page titles when none is given
    #[serde(default = "default_true")]
    pub resolve_titles: bool,

    /// Upper bound on a title fetch, in seconds
    #[serde(default = "default_timeout_secs")]
    pub resolve_timeout_secs: u64,

    /// User agent sent with title requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Duplicate tags within a link: preserve or dedupe
    #[serde(default)]
    pub tag_policy: TagPolicy,

    /// Imported links matching an existing one: duplicate, skip or overwrite
    #[serde(default)]
    pub import_policy: ImportPolicy,

    /// Log file path (defaults to stderr when logging is enabled)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            resolve_titles: true,
            resolve_timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            tag_policy: TagPolicy::default(),
            import_policy: ImportPolicy::default(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (LINKCART_DATA_DIR, LINKCART_RESOLVE_TITLES,
    ///    LINKCART_RESOLVE_TIMEOUT)
    /// 2. Config file (~/.config/linkcart/config.toml or LINKCART_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load only what the file says, without environment overrides
    ///
    /// Use this before [`Config::save_to_path`] so overrides are not written
    /// back. A missing file gives the defaults.
    pub fn load_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // LINKCART_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            if !val.is_empty() {
                self.data_dir = PathBuf::from(val);
            }
        }

        // LINKCART_RESOLVE_TITLES
        if let Ok(val) = std::env::var(format!("{}_RESOLVE_TITLES", ENV_PREFIX)) {
            self.resolve_titles = val.eq_ignore_ascii_case("true") || val == "1";
        }

        // LINKCART_RESOLVE_TIMEOUT (seconds); unparsable values are ignored
        if let Ok(val) = std::env::var(format!("{}_RESOLVE_TIMEOUT", ENV_PREFIX)) {
            if let Ok(secs) = val.trim().parse::<u64>() {
                self.resolve_timeout_secs = secs;
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with LINKCART_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("linkcart")
            .join("config.toml")
    }

    /// Get the path to the saved collection
    pub fn links_path(&self) -> PathBuf {
        self.data_dir.join(LINKS_FILE)
    }

    /// Title fetch timeout; zero falls back to the default
    pub fn resolve_timeout(&self) -> Duration {
        if self.resolve_timeout_secs == 0 {
            DEFAULT_TIMEOUT
        } else {
            Duration::from_secs(self.resolve_timeout_secs)
        }
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("linkcart")
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
