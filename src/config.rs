//! Runtime configuration
//!
//! One JSON config file drives every command. `data_dir` is the only
//! required field; everything else has a default. Validation happens at
//! load time so a bad config never reaches boot.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Configuration failures. All of them abort the command before boot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {path}: {reason}")]
    Unreadable { path: String, reason: String },
    /// The config file is not valid JSON for the expected shape.
    #[error("Invalid config JSON: {0}")]
    Malformed(String),
    /// A field value violates its constraints.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_shard_count() -> usize {
    16
}

fn default_journal_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Number of shard mutexes serializing same-key changes (default 16)
    #[serde(default = "default_shard_count")]
    pub shard_count: usize,

    /// Whether accepted changes are journaled (default true)
    #[serde(default = "default_journal_enabled")]
    pub journal_enabled: bool,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Malformed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate field constraints.
    fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }

        if self.shard_count == 0 {
            return Err(ConfigError::Invalid("shard_count must be >= 1".into()));
        }

        if Severity::parse(&self.log_level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "Invalid log_level: '{}'. Expected one of trace, info, warn, error, fatal.",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Get data directory as Path.
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Directory holding descriptor files.
    pub fn descriptor_dir(&self) -> PathBuf {
        self.data_path().join("descriptors")
    }

    /// Directory holding the change journal.
    pub fn journal_dir(&self) -> PathBuf {
        self.data_path().join("journal")
    }

    /// Path of the change journal file.
    pub fn journal_path(&self) -> PathBuf {
        self.journal_dir().join("changes.log")
    }

    /// The configured minimum log severity.
    pub fn min_severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_config(temp_dir: &TempDir, content: &serde_json::Value) -> PathBuf {
        let path = temp_dir.path().join("aspectdb.json");
        fs::write(&path, content.to_string()).unwrap();
        path
    }

    #[test]
    fn test_defaults_applied() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, &json!({"data_dir": "./data"}));

        let config = Config::load(&path).unwrap();
        assert_eq!(config.shard_count, 16);
        assert!(config.journal_enabled);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.min_severity(), Severity::Info);
    }

    #[test]
    fn test_explicit_values_win() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            &json!({
                "data_dir": "/var/lib/aspectdb",
                "shard_count": 4,
                "journal_enabled": false,
                "log_level": "trace"
            }),
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.shard_count, 4);
        assert!(!config.journal_enabled);
        assert_eq!(config.min_severity(), Severity::Trace);
    }

    #[test]
    fn test_missing_data_dir_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, &json!({"shard_count": 8}));

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Malformed(_))));
    }

    #[test]
    fn test_zero_shard_count_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            &json!({"data_dir": "./data", "shard_count": 0}),
        );

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("shard_count"));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            &json!({"data_dir": "./data", "log_level": "verbose"}),
        );

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load(&temp_dir.path().join("nope.json"));
        assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
    }

    #[test]
    fn test_path_helpers() {
        let config = Config {
            data_dir: "/data".to_string(),
            shard_count: 16,
            journal_enabled: true,
            log_level: "info".to_string(),
        };

        assert_eq!(config.data_path(), Path::new("/data"));
        assert_eq!(config.descriptor_dir(), PathBuf::from("/data/descriptors"));
        assert_eq!(
            config.journal_path(),
            PathBuf::from("/data/journal/changes.log")
        );
    }
}
