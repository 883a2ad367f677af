//! Endpoint model loaded from the per-service configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport protocol of an endpoint or of a downstream route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Grpc,
}

impl Protocol {
    /// Label used in route responses ("HTTP" / "gRPC")
    pub fn label(&self) -> &'static str {
        match self {
            Protocol::Http => "HTTP",
            Protocol::Grpc => "gRPC",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Grpc => write!(f, "grpc"),
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "grpc" => Ok(Protocol::Grpc),
            other => Err(format!("unknown protocol: {}", other)),
        }
    }
}

/// How the CPU and network stressors of one endpoint are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Sequential => write!(f, "sequential"),
            ExecutionMode::Parallel => write!(f, "parallel"),
        }
    }
}

/// How downstream calls of one endpoint are issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardMode {
    /// One call after another, in configuration order
    #[default]
    Synchronous,
    /// All calls concurrently, joined before returning
    Asynchronous,
}

impl ForwardMode {
    pub fn is_parallel(&self) -> bool {
        matches!(self, ForwardMode::Asynchronous)
    }
}

/// CPU workload of an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuComplexity {
    /// CPU seconds consumed by every worker thread
    #[serde(alias = "executionTime")]
    pub execution_time: f64,

    /// Number of concurrent workers
    #[serde(default = "default_threads")]
    pub threads: usize,
}

fn default_threads() -> usize {
    1
}

impl CpuComplexity {
    pub fn new(execution_time: f64, threads: usize) -> Self {
        Self {
            execution_time,
            threads,
        }
    }
}

/// Network workload of an endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkComplexity {
    #[serde(default, alias = "forwardRequests")]
    pub forward_requests: ForwardMode,

    /// Size in bytes of the generated response payload
    #[serde(default, alias = "responsePayloadSize")]
    pub response_payload_size: usize,

    #[serde(default, alias = "calledServices")]
    pub called_services: Vec<CalledServiceRef>,
}

/// Circuit breaker parameters of a protected route
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    /// Per-call timeout
    #[serde(with = "serde_seconds")]
    pub timeout: Duration,

    /// Cooldown before the breaker lets a probe through again
    #[serde(with = "serde_seconds", alias = "retryTimer")]
    pub retry_timer: Duration,
}

/// One configured downstream route of an endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalledServiceRef {
    pub service: String,

    pub endpoint: String,

    /// Omitted from the target address when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default)]
    pub protocol: Protocol,

    /// Number of times this route is invoked per request
    #[serde(default = "default_ratio", alias = "trafficForwardRatio")]
    pub traffic_forward_ratio: usize,

    #[serde(default, alias = "requestPayloadSize")]
    pub request_payload_size: usize,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "circuitBreaker")]
    pub circuit_breaker: Option<CircuitBreakerSettings>,
}

fn default_ratio() -> usize {
    1
}

impl CalledServiceRef {
    pub fn new(service: impl Into<String>, endpoint: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            service: service.into(),
            endpoint: endpoint.into(),
            port: None,
            protocol,
            traffic_forward_ratio: 1,
            request_payload_size: 0,
            circuit_breaker: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_ratio(mut self, ratio: usize) -> Self {
        self.traffic_forward_ratio = ratio;
        self
    }

    pub fn with_request_payload_size(mut self, size: usize) -> Self {
        self.request_payload_size = size;
        self
    }

    pub fn with_circuit_breaker(mut self, settings: CircuitBreakerSettings) -> Self {
        self.circuit_breaker = Some(settings);
        self
    }

    /// `"{service}/{endpoint}"`, the key used in route responses
    pub fn route_label(&self) -> String {
        format!("{}/{}", self.service, self.endpoint)
    }

    /// `"{service}"` or `"{service}:{port}"`
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) if port != 0 => format!("{}:{}", self.service, port),
            _ => self.service.clone(),
        }
    }
}

/// A named, invokable unit of emulated workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDefinition {
    pub name: String,

    #[serde(default)]
    pub protocol: Protocol,

    #[serde(default, alias = "executionMode")]
    pub execution_mode: ExecutionMode,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "cpuComplexity")]
    pub cpu_complexity: Option<CpuComplexity>,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "networkComplexity")]
    pub network_complexity: Option<NetworkComplexity>,
}

impl EndpointDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            protocol: Protocol::Http,
            execution_mode: ExecutionMode::Sequential,
            cpu_complexity: None,
            network_complexity: None,
        }
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    pub fn with_cpu(mut self, execution_time: f64, threads: usize) -> Self {
        self.cpu_complexity = Some(CpuComplexity::new(execution_time, threads));
        self
    }

    pub fn with_network(mut self, network: NetworkComplexity) -> Self {
        self.network_complexity = Some(network);
        self
    }

    /// Downstream routes of this endpoint, empty without network complexity
    pub fn called_services(&self) -> &[CalledServiceRef] {
        self.network_complexity
            .as_ref()
            .map(|n| n.called_services.as_slice())
            .unwrap_or(&[])
    }
}

/// Serde helper for durations written as (fractional) seconds
pub mod serde_seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds).map_err(serde::de::Error::custom)
    }
}
