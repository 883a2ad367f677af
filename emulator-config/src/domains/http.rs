//! HTTP client configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Deadline of downstream HTTP calls on routes without a circuit breaker
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_forward_timeout"
    )]
    pub forward_timeout: Duration,

    /// User agent sent when the inbound request carried none
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum idle connections kept per downstream host
    #[serde(default = "default_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            forward_timeout: default_forward_timeout(),
            user_agent: default_user_agent(),
            pool_max_idle_per_host: default_max_idle_per_host(),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.forward_timeout.as_secs_f64(),
            "forward_timeout",
            self.domain_name(),
        )?;
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

fn default_forward_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_user_agent() -> String {
    format!("emulator/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_idle_per_host() -> usize {
    32
}
