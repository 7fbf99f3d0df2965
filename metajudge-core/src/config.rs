//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/metajudge/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/metajudge/` (~/.config/metajudge/)
//! - Data: `$XDG_DATA_HOME/metajudge/` (~/.local/share/metajudge/)
//! - State/Logs: `$XDG_STATE_HOME/metajudge/` (~/.local/state/metajudge/)

use crate::error::{Error, Result};
use crate::types::{JudgeCategory, DEFAULT_JUDGE_CATEGORIES};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Review session settings
    #[serde(default)]
    pub review: ReviewConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Review session configuration
#[derive(Debug, Deserialize)]
pub struct ReviewConfig {
    /// Directory holding `review_*.json` save files
    #[serde(default)]
    pub save_dir: Option<PathBuf>,

    /// Ordered judge categories; each maps to `{name}_score` / `{name}_reasoning` columns
    #[serde(default = "default_judge_categories")]
    pub judge_categories: Vec<String>,

    /// Idle time after an explanation edit before it is autosaved
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            save_dir: None,
            judge_categories: default_judge_categories(),
            autosave_debounce_ms: default_autosave_debounce_ms(),
        }
    }
}

impl ReviewConfig {
    /// Judge categories as domain values, in configured order.
    pub fn categories(&self) -> Vec<JudgeCategory> {
        self.judge_categories
            .iter()
            .map(|name| JudgeCategory::new(name.trim()))
            .collect()
    }

    /// Resolved save directory (configured or XDG default).
    pub fn save_dir(&self) -> PathBuf {
        self.save_dir
            .clone()
            .unwrap_or_else(|| Config::data_dir().join("saves"))
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.judge_categories.is_empty() {
            return Err(Error::Config(
                "review.judge_categories must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.judge_categories {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::Config(
                    "review.judge_categories contains an empty name".to_string(),
                ));
            }
            if !seen.insert(name) {
                return Err(Error::Config(format!(
                    "review.judge_categories lists '{}' more than once",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn default_judge_categories() -> Vec<String> {
    DEFAULT_JUDGE_CATEGORIES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_autosave_debounce_ms() -> u64 {
    500
}

/// Export configuration
#[derive(Debug, Deserialize, Default)]
pub struct ExportConfig {
    /// Directory for exported CSV files (defaults to the working directory)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl ExportConfig {
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.review.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/metajudge/config.toml` (~/.config/metajudge/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("metajudge").join("config.toml")
    }

    /// Returns the data directory path (for save files)
    ///
    /// `$XDG_DATA_HOME/metajudge/` (~/.local/share/metajudge/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("metajudge")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/metajudge/` (~/.local/state/metajudge/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("metajudge")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
