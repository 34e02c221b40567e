//! Configuration management.
//!
//! Settings come from an optional TOML file, overridden by
//! `SCHOLAR_QUERY_*` environment variables (sections separated by `__`,
//! e.g. `SCHOLAR_QUERY_COMPILER__MAX_RESULT_WINDOW=5000`).

mod file_config;

pub use file_config::ConfigFileError;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::compiler::{CompilerSettings, MAX_RESULT_WINDOW};
use crate::models::DEFAULT_PAGE_SIZE;

/// File name looked up in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "scholar-query.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Query compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Query compiler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Largest `start + page_size` a query may request
    #[serde(default = "default_max_result_window")]
    pub max_result_window: usize,

    /// Page size used when a query does not set one
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_result_window: default_max_result_window(),
            default_page_size: default_page_size(),
        }
    }
}

impl CompilerConfig {
    pub fn settings(&self) -> CompilerSettings {
        CompilerSettings {
            max_result_window: self.max_result_window,
        }
    }
}

fn default_max_result_window() -> usize {
    MAX_RESULT_WINDOW
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` for structured output; anything else is human-readable
    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.as_deref() == Some("json")
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("SCHOLAR_QUERY")
        .prefix_separator("_")
        .separator("__")
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    settings.try_deserialize()
}

/// Load configuration from environment variables only
pub fn load_env_config() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(environment())
        .build()?
        .try_deserialize()
}

/// First existing config file: working directory, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    default_config_path().filter(|path| path.is_file())
}

/// `<config dir>/scholar-query/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scholar-query").join("config.toml"))
}

/// Get the effective configuration, falling back to defaults when loading fails
pub fn get_config() -> Config {
    let loaded = match find_config_file() {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            load_config(&path)
        }
        None => load_env_config(),
    };
    loaded.unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.compiler.max_result_window, 10_000);
        assert_eq!(config.compiler.default_page_size, 50);
        assert_eq!(config.logging.level, "warn");
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[compiler]\nmax_result_window = 500\n\n[logging]\nformat = \"json\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.compiler.max_result_window, 500);
        assert_eq!(config.compiler.default_page_size, 50);
        assert!(config.logging.is_json());
        assert_eq!(config.compiler.settings().max_result_window, 500);
    }

    #[test]
    fn test_default_config_path() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("scholar-query/config.toml"));
        }
    }
}
