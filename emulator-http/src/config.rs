//! HTTP configuration

use emulator_config::HttpConfig as ConfigHttpConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Deadline of calls on routes without a circuit breaker
    pub forward_timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Maximum idle connections kept per downstream host
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        ConfigHttpConfig::default().into()
    }
}

impl From<ConfigHttpConfig> for HttpConfig {
    fn from(config: ConfigHttpConfig) -> Self {
        Self {
            forward_timeout: config.forward_timeout,
            user_agent: config.user_agent,
            pool_max_idle_per_host: config.pool_max_idle_per_host,
        }
    }
}
