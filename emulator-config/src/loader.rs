//! Configuration loading and environment variable handling

use crate::domains::EmulatorConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_VAR: &str = "CONF";

/// Unprefixed service name override set by deployments
pub const SERVICE_NAME_VAR: &str = "SERVICE_NAME";

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "EMULATOR".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a JSON or YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<EmulatorConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let mut config: EmulatorConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };

        info!("Loaded configuration from {}", path.display());

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from the `CONF` file when set, else the built-in default
    pub fn from_env(&self) -> ConfigResult<EmulatorConfig> {
        if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
            return self.from_file(path);
        }

        warn!("{} is not set, using the default configuration", CONFIG_PATH_VAR);
        let mut config = EmulatorConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<EmulatorConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut EmulatorConfig) -> ConfigResult<()> {
        if let Ok(name) = self
            .get_env_var("SERVICE_NAME")
            .or_else(|_| std::env::var(SERVICE_NAME_VAR))
        {
            config.service_name = name;
        }

        if let Ok(processes) = self.get_env_var("PROCESSES") {
            config.processes = self.parse("PROCESSES", &processes)?;
        }

        if let Ok(strategy) = self.get_env_var("CPU_STRATEGY") {
            config.execution.cpu_strategy = FromStr::from_str(&strategy)
                .map_err(|_| ConfigError::EnvError(format!("Invalid CPU_STRATEGY: {}", strategy)))?;
        }

        self.apply_server_overrides(&mut config.server)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_logging_overrides(&mut config.logging_config)?;

        Ok(())
    }

    /// Apply server config overrides
    fn apply_server_overrides(
        &self,
        config: &mut crate::domains::server::ServerConfig,
    ) -> ConfigResult<()> {
        if let Ok(bind) = self.get_env_var("BIND_ADDRESS") {
            config.bind_address = bind;
        }

        if let Ok(port) = self.get_env_var("HTTP_PORT") {
            config.http_port = self.parse("HTTP_PORT", &port)?;
        }

        if let Ok(port) = self.get_env_var("GRPC_PORT") {
            config.grpc_port = self.parse("GRPC_PORT", &port)?;
        }

        Ok(())
    }

    /// Apply HTTP config overrides
    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Ok(timeout) = self.get_env_var("FORWARD_TIMEOUT") {
            let seconds: f64 = self.parse("FORWARD_TIMEOUT", &timeout)?;
            config.forward_timeout = Duration::try_from_secs_f64(seconds)
                .map_err(|e| ConfigError::EnvError(format!("Invalid FORWARD_TIMEOUT: {}", e)))?;
        }

        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = FromStr::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = FromStr::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    fn parse<T>(&self, name: &str, value: &str) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        value
            .parse()
            .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e)))
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
