//! Domain-driven configuration management for the service emulator
//!
//! This crate loads the per-service description (endpoints, downstream
//! routes, circuit breaker settings) together with the ambient settings of
//! the process, applies environment overrides and validates the result.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    execution::{CpuStrategyKind, ExecutionConfig},
    http::HttpConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    rpc::RpcConfig,
    server::ServerConfig,
    EmulatorConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
