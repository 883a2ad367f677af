//! Configuration error types

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a service description could not be loaded
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read service description: {0}")]
    FileReadError(#[from] std::io::Error),

    /// YAML description (`.yaml` / `.yml`)
    #[error("Failed to parse YAML service description: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// JSON description, any other extension
    #[error("Failed to parse JSON service description: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Malformed `EMULATOR_*` override
    #[error("Environment variable error: {0}")]
    EnvError(String),

    #[error("Invalid {domain} configuration: {message}")]
    DomainError { domain: String, message: String },
}
