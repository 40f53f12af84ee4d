//! Configuration management for Vigil
//!
//! Loads the TOML config file, applies `VIGIL_SECTION__KEY` environment
//! overrides, and validates the result.

use crate::error::{Result, VigilError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod validator;

pub use validator::ConfigValidator;

pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub search: SearchConfig,
    pub source: SourceConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Search engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period before a keystroke is dispatched
    pub debounce_ms: u64,
    /// `limit` passed to the event log on each cycle
    pub event_fetch_limit: usize,
    /// Presentation cap on displayed results
    pub max_displayed: usize,
}

/// Where the three domain collaborators live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: String, // "fixtures" or "http"
    pub fixtures_dir: PathBuf,
    pub base_url: String,
    /// Environment variable holding the session bearer token
    pub token_env: String,
    pub timeout_secs: u64,
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VigilError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| VigilError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };

        if !path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults. Run 'vigil config init' to create one.",
                path.display()
            );
            let mut config = Config::default();
            config.apply_env_overrides();
            ConfigValidator::validate(&config)?;
            return Ok(config);
        }

        Self::load(&path)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| VigilError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: VIGIL_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("VIGIL_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "SEARCH__DEBOUNCE_MS" => {
                self.search.debounce_ms = parse_number(path, value)?;
            }
            "SEARCH__EVENT_FETCH_LIMIT" => {
                self.search.event_fetch_limit = parse_number(path, value)?;
            }
            "SEARCH__MAX_DISPLAYED" => {
                self.search.max_displayed = parse_number(path, value)?;
            }
            "SOURCE__KIND" => {
                self.source.kind = value.to_string();
            }
            "SOURCE__BASE_URL" => {
                self.source.base_url = value.to_string();
            }
            "SOURCE__FIXTURES_DIR" => {
                self.source.fixtures_dir = PathBuf::from(value);
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| VigilError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("vigil").join("config.toml"))
    }
}

fn parse_number<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| VigilError::InvalidConfigValue {
            path: path.to_string(),
            message: format!("Cannot parse '{}' as a number", value),
        })
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            search: SearchConfig {
                debounce_ms: 300,
                event_fetch_limit: 200,
                max_displayed: 50,
            },
            source: SourceConfig {
                kind: "fixtures".to_string(),
                fixtures_dir: PathBuf::from("~/.vigil/fixtures"),
                base_url: "http://localhost:8000/api/".to_string(),
                token_env: "VIGIL_API_TOKEN".to_string(),
                timeout_secs: 10,
            },
        }
    }
}
