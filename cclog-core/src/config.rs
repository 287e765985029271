//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/cclog/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/cclog/` (~/.config/cclog/)
//! - State/Logs: `$XDG_STATE_HOME/cclog/` (~/.local/state/cclog/)

use crate::error::{Error, Result};
use serde::Deserialize;
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

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Reconstruction engine tuning
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tuning knobs for the reconstruction engine.
///
/// Passed by reference into [`crate::engine::Engine`]; nothing in the engine
/// reads configuration from ambient state.
#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Minimum normalized length (in bytes) both texts must exceed before a
    /// prefix relationship counts as a sidechain match.
    #[serde(default = "default_min_prefix_match_len")]
    pub min_prefix_match_len: usize,

    /// Add estimated output tokens to a node's conversation size.
    ///
    /// Off by default: the total represents context sent to the model.
    #[serde(default)]
    pub include_output_in_total: bool,

    /// Tool names whose invocations spawn a sidechain conversation
    #[serde(default = "default_task_tool_names")]
    pub task_tool_names: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_prefix_match_len: default_min_prefix_match_len(),
            include_output_in_total: false,
            task_tool_names: default_task_tool_names(),
        }
    }
}

impl EngineConfig {
    /// Whether invocations of `name` spawn a sidechain.
    pub fn is_task_tool(&self, name: &str) -> bool {
        self.task_tool_names.iter().any(|t| t == name)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.task_tool_names.is_empty() {
            return Err(Error::Config(
                "engine.task_tool_names must name at least one tool".to_string(),
            ));
        }
        if self.task_tool_names.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::Config(
                "engine.task_tool_names must not contain empty names".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_min_prefix_match_len() -> usize {
    50
}

fn default_task_tool_names() -> Vec<String> {
    vec!["Task".to_string()]
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
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

        config.engine.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/cclog/config.toml` (~/.config/cclog/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("cclog").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/cclog/` (~/.local/state/cclog/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("cclog")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/cclog/cclog.log` (~/.local/state/cclog/cclog.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("cclog.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.min_prefix_match_len, 50);
        assert!(!config.engine.include_output_in_total);
        assert_eq!(config.engine.task_tool_names, vec!["Task".to_string()]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[engine]
min_prefix_match_len = 20
include_output_in_total = true
task_tool_names = ["Task", "Agent"]

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.engine.min_prefix_match_len, 20);
        assert!(config.engine.include_output_in_total);
        assert!(config.engine.is_task_tool("Agent"));
        assert!(!config.engine.is_task_tool("Bash"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.max_files, 5);
    }

    #[test]
    fn test_engine_config_validation() {
        assert!(EngineConfig::default().validate().is_ok());

        let config = EngineConfig {
            task_tool_names: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            task_tool_names: vec!["  ".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nmin_prefix_match_len = 10\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.engine.min_prefix_match_len, 10);
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine\nnot toml").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_log_path() {
        assert!(Config::log_path().ends_with("cclog/cclog.log"));
    }
}
