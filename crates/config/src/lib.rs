//! Configuration loading and validation for promptweave.
//!
//! Loads configuration from `~/.promptweave/config.toml` with environment
//! variable overrides. Every field has a default, so a missing file is not
//! an error.

use promptweave_core::LocalStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.promptweave/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where file and image reads come from
    #[serde(default)]
    pub store: StoreConfig,

    /// Default snapshot location
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Logging defaults for the binary
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Relative paths resolve against this directory.
    #[serde(default = "default_store_root")]
    pub root: PathBuf,

    /// Text reads larger than this are cut with a marker. Images are read whole.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
}

fn default_store_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_max_file_bytes() -> usize {
    1024 * 1024
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
}

fn default_snapshot_path() -> PathBuf {
    AppConfig::config_dir().join("conversation.json")
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset and `--verbose` is off.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

impl AppConfig {
    /// Load configuration from the default location.
    ///
    /// Environment overrides:
    /// - `PROMPTWEAVE_SNAPSHOT`: snapshot path
    /// - `PROMPTWEAVE_STORE_ROOT`: store root directory
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("PROMPTWEAVE_SNAPSHOT") {
            self.snapshot.path = PathBuf::from(path);
        }
        if let Some(root) = lookup("PROMPTWEAVE_STORE_ROOT") {
            self.store.root = PathBuf::from(root);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".promptweave")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.max_file_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "store.max_file_bytes must be > 0".into(),
            ));
        }

        let level = self.log.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.log.level
            )));
        }

        Ok(())
    }

    /// The local byte store described by `[store]`.
    pub fn local_store(&self) -> LocalStore {
        LocalStore::new()
            .with_root(&self.store.root)
            .with_max_bytes(self.store.max_file_bytes)
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.store.max_file_bytes, 1024 * 1024);
        assert_eq!(config.log.level, "info");
        assert!(config.snapshot.path.ends_with(".promptweave/conversation.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn zero_byte_cap_rejected() {
        let config = AppConfig {
            store: StoreConfig {
                max_file_bytes: 0,
                ..StoreConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_log_level_rejected() {
        let mut config = AppConfig::default();
        config.log.level = "loud".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("loud"));

        config.log.level = "DEBUG".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert_eq!(result.unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nroot = \"/srv/project\"").unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.store.root, PathBuf::from("/srv/project"));
        assert_eq!(config.store.max_file_bytes, 1024 * 1024);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn invalid_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store\nroot = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn invalid_values_in_file_fail_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nmax_file_bytes = 0").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn env_overrides_paths() {
        let env: HashMap<&str, &str> = [
            ("PROMPTWEAVE_SNAPSHOT", "/tmp/snap.json"),
            ("PROMPTWEAVE_STORE_ROOT", "/work"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.snapshot.path, PathBuf::from("/tmp/snap.json"));
        assert_eq!(config.store.root, PathBuf::from("/work"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("max_file_bytes = 1048576"));
        assert!(toml_str.contains("level = \"info\""));
    }
}
