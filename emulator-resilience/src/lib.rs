//! Resilience patterns for the service emulator
//!
//! This crate provides the per-route circuit breaker that guards downstream
//! calls and the registry that owns one breaker per protected route.

pub mod circuit_breaker;
pub mod registry;

// Re-export commonly used types
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerBuilder, CircuitBreakerConfig, CircuitMetrics, CircuitState,
};
pub use registry::CircuitBreakerRegistry;
