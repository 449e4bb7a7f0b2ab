//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/stash/config.toml)
//! 3. Environment variables (STASH_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "STASH";

/// Standard variable set by the Firebase tooling when the emulator runs
const FIRESTORE_EMULATOR_ENV: &str = "FIRESTORE_EMULATOR_HOST";

/// Keys accepted by [`Config::set_value`]
pub const CONFIG_KEYS: &[&str] = &[
    "project_id",
    "api_key",
    "emulator_host",
    "collection",
    "user_id",
    "id_token",
    "metadata_endpoint",
    "fetch_timeout_secs",
    "log_file",
];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Firebase project id
    #[serde(default)]
    pub project_id: Option<String>,

    /// Web API key of the Firebase project
    #[serde(default)]
    pub api_key: Option<String>,

    /// Firestore emulator `host:port` (overrides the hosted service)
    #[serde(default)]
    pub emulator_host: Option<String>,

    /// Collection holding bookmark documents
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Signed-in user id
    #[serde(default)]
    pub user_id: Option<String>,

    /// Firebase ID token of the signed-in user
    #[serde(default)]
    pub id_token: Option<String>,

    /// External metadata service; pages are scraped directly when unset
    #[serde(default)]
    pub metadata_endpoint: Option<String>,

    /// Timeout for metadata requests
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Log file path (logs go to stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: None,
            api_key: None,
            emulator_host: None,
            collection: default_collection(),
            user_id: None,
            id_token: None,
            metadata_endpoint: None,
            fetch_timeout_secs: default_fetch_timeout(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (STASH_PROJECT_ID, STASH_USER_ID, ...)
    /// 2. Config file (~/.config/stash/config.toml or STASH_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring an explicit path (from `--config`)
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
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
        let optional = |name: &str, slot: &mut Option<String>| {
            if let Ok(val) = std::env::var(format!("{}_{}", ENV_PREFIX, name)) {
                *slot = if val.is_empty() { None } else { Some(val) };
            }
        };

        optional("PROJECT_ID", &mut self.project_id);
        optional("API_KEY", &mut self.api_key);
        optional("USER_ID", &mut self.user_id);
        optional("ID_TOKEN", &mut self.id_token);
        optional("METADATA_ENDPOINT", &mut self.metadata_endpoint);

        // STASH_EMULATOR_HOST beats the generic Firebase variable
        if let Ok(val) = std::env::var(FIRESTORE_EMULATOR_ENV) {
            self.emulator_host = if val.is_empty() { None } else { Some(val) };
        }
        optional("EMULATOR_HOST", &mut self.emulator_host);

        if let Ok(val) = std::env::var(format!("{}_COLLECTION", ENV_PREFIX)) {
            if !val.is_empty() {
                self.collection = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_FETCH_TIMEOUT_SECS", ENV_PREFIX)) {
            if let Ok(secs) = val.parse() {
                self.fetch_timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }
    }

    /// Set a single key from its string form
    ///
    /// An empty value or `none` clears optional keys.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let optional = |v: &str| {
            if v.is_empty() || v == "none" {
                None
            } else {
                Some(v.to_string())
            }
        };

        match key {
            "project_id" => self.project_id = optional(value),
            "api_key" => self.api_key = optional(value),
            "emulator_host" => self.emulator_host = optional(value),
            "user_id" => self.user_id = optional(value),
            "id_token" => self.id_token = optional(value),
            "metadata_endpoint" => self.metadata_endpoint = optional(value),
            "collection" => {
                if value.is_empty() {
                    bail!("collection cannot be empty");
                }
                self.collection = value.to_string();
            }
            "fetch_timeout_secs" => {
                self.fetch_timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout: {}", value))?;
            }
            "log_file" => self.log_file = optional(value).map(PathBuf::from),
            _ => bail!(
                "Unknown configuration key '{}'. Valid keys: {}",
                key,
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
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
    /// Can be overridden with STASH_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stash")
            .join("config.toml")
    }
}

fn default_collection() -> String {
    "links".to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}
