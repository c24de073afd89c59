//! Service configuration.

use crate::scheduler::DEFAULT_MAX_TICKS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound accepted for `max_ticks`.
pub const MAX_TICKS_LIMIT: u32 = 1000;

/// Errors loading or validating a service configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration of the simulation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Directory the project builder writes generated projects to.
    pub projects_path: PathBuf,
    /// Tick bound applied to every simulation.
    pub max_ticks: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
            projects_path: PathBuf::from("./esp32_projects"),
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl ServiceConfig {
    /// Load a configuration file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse a configuration from YAML.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_TICKS_LIMIT).contains(&self.max_ticks) {
            return Err(ConfigError::Invalid(format!(
                "max_ticks must be between 1 and {}, got {}",
                MAX_TICKS_LIMIT, self.max_ticks
            )));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host cannot be empty".to_string()));
        }
        Ok(())
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
