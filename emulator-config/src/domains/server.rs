//! Server configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// Listener configuration of the emulated service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind both listeners to
    pub bind_address: String,

    /// Port of the HTTP listener
    pub http_port: u16,

    /// Port of the gRPC listener
    pub grpc_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            http_port: 5000,
            grpc_port: 5001,
        }
    }
}

impl ServerConfig {
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.http_port)
    }

    pub fn grpc_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.grpc_port)
    }
}

impl Validatable for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.bind_address, "bind_address", self.domain_name())?;

        // Port 0 binds an ephemeral port, so only a clash between two fixed ports is an error
        if self.http_port != 0 && self.http_port == self.grpc_port {
            return Err(self.validation_error(format!(
                "http_port and grpc_port cannot both be {}",
                self.http_port
            )));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "server"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_addresses() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr(), "0.0.0.0:5000");
        assert_eq!(config.grpc_addr(), "0.0.0.0:5001");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_port_clash_rejected() {
        let config = ServerConfig {
            grpc_port: 5000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
