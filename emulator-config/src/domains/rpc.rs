//! gRPC client configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outbound gRPC client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Deadline of downstream gRPC calls on routes without a circuit breaker
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_forward_timeout"
    )]
    pub forward_timeout: Duration,

    /// Deadline for establishing a channel
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_connect_timeout"
    )]
    pub connect_timeout: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            forward_timeout: default_forward_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl Validatable for RpcConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.forward_timeout.as_secs_f64(),
            "forward_timeout",
            self.domain_name(),
        )?;
        validate_positive(
            self.connect_timeout.as_secs_f64(),
            "connect_timeout",
            self.domain_name(),
        )
    }

    fn domain_name(&self) -> &'static str {
        "rpc"
    }
}

fn default_forward_timeout() -> Duration {
    Duration::from_secs(1)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(1)
}
