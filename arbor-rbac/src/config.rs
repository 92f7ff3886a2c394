//! Configuration for the authorization layer

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading configuration file
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvError(String),

    /// Validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Settings for an [`Arbor`](crate::Arbor) instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacConfig {
    /// Enables root-entry protection and the superadmin bypass
    pub superadmin_enabled: bool,

    /// Casbin model file path (optional, defaults to the embedded model)
    pub model_path: Option<PathBuf>,

    /// Tracing filter directive used by [`crate::logging::init_tracing`]
    pub log_level: String,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            superadmin_enabled: true,
            model_path: None,
            log_level: "info".to_string(),
        }
    }
}

impl RbacConfig {
    /// Configuration with the superadmin toggle set
    pub fn with_superadmin(enabled: bool) -> Self {
        Self {
            superadmin_enabled: enabled,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "log_level cannot be empty".to_string(),
            ));
        }

        if let Some(path) = &self.model_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(
                    "model_path cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "ARBOR".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<RbacConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: RbacConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<RbacConfig> {
        let mut config = RbacConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<RbacConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut RbacConfig) -> ConfigResult<()> {
        if let Ok(enabled) = self.get_env_var("SUPERADMIN_ENABLED") {
            config.superadmin_enabled = enabled.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid SUPERADMIN_ENABLED: {}", e))
            })?;
        }

        if let Ok(path) = self.get_env_var("MODEL_PATH") {
            config.model_path = Some(PathBuf::from(path));
        }

        if let Ok(level) = self.get_env_var("LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
