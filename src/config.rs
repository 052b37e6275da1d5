//! TOML configuration.
//!
//! ```toml
//! [validation]
//! min_duration_minutes = 30
//! max_duration_minutes = 600
//! max_id_length = 100
//!
//! [storage]
//! data_dir = "./data"
//! fsync = true
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, TheatreResult, ValidationError};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "THEATREKB_CONFIG";

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input bounds.
    pub validation: ValidationLimits,
    /// Snapshot storage.
    pub storage: StorageSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, parsed, or validated.
    pub fn from_file(path: impl AsRef<Path>) -> TheatreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Fails if the text is not valid TOML or a value is out of range.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> TheatreResult<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `$THEATREKB_CONFIG` or default locations, or use defaults.
    ///
    /// # Errors
    ///
    /// Fails only if a config file exists but is invalid.
    pub fn load() -> TheatreResult<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            tracing::info!("Loading config from: {}", PathBuf::from(&path).display());
            return Self::from_file(path);
        }

        let config_paths = [
            PathBuf::from("theatrekb.toml"),
            PathBuf::from("config/theatrekb.toml"),
        ];
        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.validation;
        if v.min_duration_minutes == 0 {
            return Err(ConfigError::Invalid {
                field: "validation.min_duration_minutes",
                reason: "must be > 0".to_string(),
            });
        }
        if v.min_duration_minutes > v.max_duration_minutes {
            return Err(ConfigError::Invalid {
                field: "validation.max_duration_minutes",
                reason: format!(
                    "{} is below min_duration_minutes {}",
                    v.max_duration_minutes, v.min_duration_minutes
                ),
            });
        }
        if v.max_id_length == 0 {
            return Err(ConfigError::Invalid {
                field: "validation.max_id_length",
                reason: "must be > 0".to_string(),
            });
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "storage.data_dir",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Bounds applied to caller-supplied values before any mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    /// Shortest accepted duration, in minutes.
    pub min_duration_minutes: u32,
    /// Longest accepted duration, in minutes.
    pub max_duration_minutes: u32,
    /// Longest accepted entity id, in characters.
    pub max_id_length: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            min_duration_minutes: 30,
            max_duration_minutes: 600,
            max_id_length: 100,
        }
    }
}

impl ValidationLimits {
    /// Checks a duration against the configured bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DurationOutOfRange`] naming `field`.
    pub const fn check_duration(&self, field: &'static str, value: u32) -> Result<(), ValidationError> {
        if value < self.min_duration_minutes || value > self.max_duration_minutes {
            return Err(ValidationError::DurationOutOfRange {
                field,
                value,
                min: self.min_duration_minutes,
                max: self.max_duration_minutes,
            });
        }
        Ok(())
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the snapshot file.
    pub data_dir: PathBuf,
    /// Whether to fsync after every snapshot write.
    pub fsync: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            fsync: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.validation.min_duration_minutes, 30);
        assert_eq!(config.validation.max_duration_minutes, 600);
        assert_eq!(config.validation.max_id_length, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_str("[validation]\nmax_duration_minutes = 480\n").unwrap();
        assert_eq!(config.validation.max_duration_minutes, 480);
        assert_eq!(config.validation.min_duration_minutes, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = Config::from_str(
            "[validation]\nmin_duration_minutes = 90\nmax_duration_minutes = 60\n",
        )
        .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_bad_toml_rejected() {
        assert!(Config::from_str("[validation\n").unwrap_err().is_config());
    }

    #[test]
    fn test_check_duration_bounds() {
        let limits = ValidationLimits::default();
        assert!(limits.check_duration("estimated_duration", 30).is_ok());
        assert!(limits.check_duration("estimated_duration", 600).is_ok());
        assert!(limits.check_duration("estimated_duration", 29).is_err());
        assert!(limits.check_duration("estimated_duration", 601).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theatrekb.toml");
        std::fs::write(&path, "[logging]\njson = true\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert!(config.logging.json);

        let missing = Config::from_file(dir.path().join("nope.toml")).unwrap_err();
        assert!(missing.is_config());
    }
}
