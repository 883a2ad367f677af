//! Process-wide registry of per-route circuit breakers

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerBuilder, CircuitBreakerConfig};
use emulator_core::EndpointDefinition;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::info;

/// Breakers keyed by `"{sourceEndpoint}:{destService}/{destEndpoint}"`.
///
/// Populated at startup and read-mostly afterwards; the lock is only held
/// for map insertion and lookup, never across a call.
#[derive(Debug, Default)]
pub struct CircuitBreakerRegistry {
    breakers: RwLock<HashMap<String, CircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a breaker for every route that carries circuit breaker settings
    pub fn from_endpoints(endpoints: &[EndpointDefinition]) -> Self {
        let registry = Self::new();
        for endpoint in endpoints {
            for called in endpoint.called_services() {
                if let Some(settings) = called.circuit_breaker {
                    registry.register(
                        &endpoint.name,
                        &called.service,
                        &called.endpoint,
                        CircuitBreakerConfig::from(settings),
                    );
                }
            }
        }
        registry
    }

    pub fn route_key(source_endpoint: &str, service: &str, endpoint: &str) -> String {
        format!("{}:{}/{}", source_endpoint, service, endpoint)
    }

    /// Register a breaker for a route, keeping an existing one untouched
    pub fn register(
        &self,
        source_endpoint: &str,
        service: &str,
        endpoint: &str,
        config: CircuitBreakerConfig,
    ) -> CircuitBreaker {
        let key = Self::route_key(source_endpoint, service, endpoint);
        let mut breakers = self.breakers.write();

        breakers
            .entry(key.clone())
            .or_insert_with(|| {
                info!(
                    "Registered circuit breaker {} (timeout {:?}, retry after {:?})",
                    key, config.timeout, config.retry_after
                );
                CircuitBreakerBuilder::new(key.clone())
                    .timeout(config.timeout)
                    .retry_after(config.retry_after)
                    .build()
            })
            .clone()
    }

    /// Breaker protecting a route, if the route is protected
    pub fn get(&self, source_endpoint: &str, service: &str, endpoint: &str) -> Option<CircuitBreaker> {
        let key = Self::route_key(source_endpoint, service, endpoint);
        self.breakers.read().get(&key).cloned()
    }

    /// Registered route keys, sorted
    pub fn routes(&self) -> Vec<String> {
        let mut routes: Vec<String> = self.breakers.read().keys().cloned().collect();
        routes.sort();
        routes
    }

    pub fn len(&self) -> usize {
        self.breakers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emulator_core::{CalledServiceRef, CircuitBreakerSettings, NetworkComplexity, Protocol};
    use std::time::Duration;

    #[test]
    fn test_route_key_format() {
        assert_eq!(
            CircuitBreakerRegistry::route_key("ep1", "svcB", "ep2"),
            "ep1:svcB/ep2"
        );
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = CircuitBreakerRegistry::new();
        let first = registry.register("ep1", "svcB", "ep2", CircuitBreakerConfig::default());
        let second = registry.register(
            "ep1",
            "svcB",
            "ep2",
            CircuitBreakerConfig {
                timeout: Duration::from_secs(9),
                retry_after: Duration::from_secs(9),
            },
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(first.config(), second.config());
    }

    #[test]
    fn test_from_endpoints_registers_protected_routes_only() {
        let settings = CircuitBreakerSettings {
            timeout: Duration::from_secs(2),
            retry_timer: Duration::from_secs(4),
        };
        let endpoint = EndpointDefinition::new("ep1").with_network(NetworkComplexity {
            called_services: vec![
                CalledServiceRef::new("svcB", "ep1", Protocol::Http).with_circuit_breaker(settings),
                CalledServiceRef::new("svcC", "ep1", Protocol::Grpc),
            ],
            ..Default::default()
        });

        let registry = CircuitBreakerRegistry::from_endpoints(&[endpoint]);

        assert_eq!(registry.routes(), vec!["ep1:svcB/ep1".to_string()]);
        let breaker = registry.get("ep1", "svcB", "ep1").unwrap();
        assert_eq!(breaker.route(), "ep1:svcB/ep1");
        assert_eq!(breaker.config().timeout, Duration::from_secs(2));
        assert_eq!(breaker.config().retry_after, Duration::from_secs(4));
        assert!(registry.get("ep1", "svcC", "ep1").is_none());
    }
}
