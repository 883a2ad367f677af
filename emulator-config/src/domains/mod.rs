//! Domain-specific configuration modules

pub mod endpoints;
pub mod execution;
pub mod http;
pub mod logging;
pub mod rpc;
pub mod server;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use emulator_core::{EndpointDefinition, NetworkComplexity, Protocol};
use serde::{Deserialize, Serialize};

/// Configuration of one emulated service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Name reported in CPU and network task labels
    #[serde(alias = "serviceName")]
    pub service_name: String,

    /// Transport the service listens on
    pub protocol: Protocol,

    /// Upper bound of worker threads serving requests
    pub processes: usize,

    /// Per-request trace logging
    #[serde(default)]
    pub logging: bool,

    /// Build the configuration was generated for
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "buildID")]
    pub build_id: Option<String>,

    pub execution: execution::ExecutionConfig,

    pub server: server::ServerConfig,

    pub http: http::HttpConfig,

    pub rpc: rpc::RpcConfig,

    pub logging_config: logging::LoggingConfig,

    #[serde(default)]
    pub endpoints: Vec<EndpointDefinition>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        let endpoint = |name: &str, protocol: Protocol| {
            EndpointDefinition::new(name)
                .with_protocol(protocol)
                .with_cpu(0.0, 1)
                .with_network(NetworkComplexity {
                    response_payload_size: 128,
                    ..Default::default()
                })
        };

        Self {
            service_name: "emulator".to_string(),
            protocol: Protocol::Http,
            processes: 8,
            logging: true,
            build_id: None,
            execution: execution::ExecutionConfig::default(),
            server: server::ServerConfig::default(),
            http: http::HttpConfig::default(),
            rpc: rpc::RpcConfig::default(),
            logging_config: logging::LoggingConfig::default(),
            endpoints: vec![
                endpoint("test-endpoint-http", Protocol::Http),
                endpoint("test-endpoint-grpc", Protocol::Grpc),
            ],
        }
    }
}

impl EmulatorConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.validate()?;
        self.execution.validate()?;
        self.server.validate()?;
        self.http.validate()?;
        self.rpc.validate()?;
        self.logging_config.validate()?;
        endpoints::EndpointTable(&self.endpoints).validate()?;
        Ok(())
    }

    /// Look up a served endpoint by name
    pub fn endpoint(&self, name: &str) -> Option<&EndpointDefinition> {
        self.endpoints.iter().find(|endpoint| endpoint.name == name)
    }

    /// Generate a sample configuration document
    pub fn generate_sample() -> String {
        serde_json::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Validatable for EmulatorConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.service_name, "service_name", self.domain_name())?;
        validate_positive(self.processes, "processes", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "service"
    }
}
