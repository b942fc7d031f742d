//! Retention configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ruuvi_types::SECOND_MS;

use crate::error::Error;
use crate::policy::{FailurePolicy, RetentionPolicy, Tier, validate_tiers};

/// Retention configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage settings.
    pub storage: StorageConfig,
    /// Retention tiers and failure handling.
    pub retention: RetentionConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// Returns the built-in defaults when no file exists there.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = self.to_toml()?;

        // Create parent directories if needed
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - Storage path is not empty
    /// - At least one tier is configured
    /// - Tier names are non-empty and unique
    /// - Bucket widths and minimum ages are positive and fit in milliseconds
    /// - Tiers are ordered oldest first (strictly decreasing minimum age)
    ///
    /// # Example
    ///
    /// ```
    /// use ruuvi_retention::Config;
    ///
    /// let config = Config::default();
    /// config.validate().expect("Default config should be valid");
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.storage.validate());
        errors.extend(self.retention.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Build the retention policy this configuration describes.
    pub fn policy(&self) -> Result<RetentionPolicy, ConfigError> {
        self.retention.policy()
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: ruuvi_store::default_db_path(),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.path".to_string(),
                message: "database path cannot be empty".to_string(),
            });
        }

        errors
    }
}

/// Retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// What to do when a sensor fails.
    pub on_error: FailurePolicy,
    /// Tiers, oldest first.
    pub tiers: Vec<TierConfig>,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        let policy = RetentionPolicy::default();
        Self {
            on_error: policy.on_error(),
            tiers: policy.tiers().iter().map(TierConfig::from_tier).collect(),
        }
    }
}

impl RetentionConfig {
    /// Validate retention configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        match self.to_tiers() {
            Ok(tiers) => validate_tiers(&tiers)
                .into_iter()
                .map(|e| ValidationError {
                    field: format!("retention.{}", e.field),
                    message: e.message,
                })
                .collect(),
            Err(errors) => errors,
        }
    }

    /// Build the retention policy.
    pub fn policy(&self) -> Result<RetentionPolicy, ConfigError> {
        let tiers = self.to_tiers().map_err(ConfigError::Validation)?;
        RetentionPolicy::new(tiers, self.on_error).map_err(|e| match e {
            Error::InvalidPolicy(errors) => ConfigError::Validation(errors),
            other => ConfigError::Validation(vec![ValidationError {
                field: "retention".to_string(),
                message: other.to_string(),
            }]),
        })
    }

    fn to_tiers(&self) -> Result<Vec<Tier>, Vec<ValidationError>> {
        let mut tiers = Vec::with_capacity(self.tiers.len());
        let mut errors = Vec::new();

        for (i, tier) in self.tiers.iter().enumerate() {
            match tier.to_tier(&format!("retention.tiers[{}]", i)) {
                Ok(t) => tiers.push(t),
                Err(e) => errors.extend(e),
            }
        }

        if errors.is_empty() { Ok(tiers) } else { Err(errors) }
    }
}

/// One tier as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Tier name.
    pub name: String,
    /// Readings at least this many seconds old are eligible.
    pub min_age_secs: u64,
    /// Bucket width in seconds.
    pub bucket_secs: u64,
}

impl TierConfig {
    /// Describe an existing tier in seconds.
    pub fn from_tier(tier: &Tier) -> Self {
        Self {
            name: tier.name.clone(),
            min_age_secs: (tier.min_age_ms / SECOND_MS).max(0) as u64,
            bucket_secs: (tier.bucket_width_ms / SECOND_MS).max(0) as u64,
        }
    }

    /// Convert to a [`Tier`], checking that both durations fit in milliseconds.
    pub fn to_tier(&self, prefix: &str) -> Result<Tier, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let min_age_ms = secs_to_millis(self.min_age_secs);
        if min_age_ms.is_none() {
            errors.push(ValidationError {
                field: format!("{}.min_age_secs", prefix),
                message: format!("{} seconds is too large", self.min_age_secs),
            });
        }

        let bucket_width_ms = secs_to_millis(self.bucket_secs);
        if bucket_width_ms.is_none() {
            errors.push(ValidationError {
                field: format!("{}.bucket_secs", prefix),
                message: format!("{} seconds is too large", self.bucket_secs),
            });
        }

        match (min_age_ms, bucket_width_ms) {
            (Some(min_age_ms), Some(bucket_width_ms)) => {
                Ok(Tier::new(self.name.clone(), min_age_ms, bucket_width_ms))
            }
            _ => Err(errors),
        }
    }
}

fn secs_to_millis(secs: u64) -> Option<i64> {
    i64::try_from(secs).ok()?.checked_mul(SECOND_MS)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field path (e.g., `storage.path` or `retention.tiers[0].bucket_secs`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub(crate) fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ruuvi")
        .join("retention.toml")
}
