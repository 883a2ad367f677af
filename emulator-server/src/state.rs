//! State shared by the HTTP and gRPC listeners

use crate::error::ServerError;
use emulator_config::EmulatorConfig;
use emulator_core::{AggregatedResponse, DownstreamClient, EndpointDefinition, RequestContext};
use emulator_execution::{CpuStressor, Engine, Forwarder, NetworkStressor};
use emulator_http::HttpClient;
use emulator_logging::EndpointTrace;
use emulator_resilience::CircuitBreakerRegistry;
use emulator_rpc::{pascal_case, RpcClient};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    engine: Engine,
    logging: bool,
    endpoints: HashMap<String, EndpointDefinition>,
    grpc_service: String,
    // PascalCase method name -> endpoint name
    grpc_methods: HashMap<String, String>,
}

impl AppState {
    pub fn new(config: &EmulatorConfig, engine: Engine) -> Self {
        let endpoints = config
            .endpoints
            .iter()
            .map(|endpoint| (endpoint.name.clone(), endpoint.clone()))
            .collect();
        let grpc_methods = config
            .endpoints
            .iter()
            .map(|endpoint| (pascal_case(&endpoint.name), endpoint.name.clone()))
            .collect();

        Self {
            inner: Arc::new(AppStateInner {
                engine,
                logging: config.logging,
                endpoints,
                grpc_service: pascal_case(&config.service_name),
                grpc_methods,
            }),
        }
    }

    /// Wire the downstream clients, breaker registry and stressors of a service
    pub fn from_config(config: &EmulatorConfig) -> Result<Self, ServerError> {
        let breakers = Arc::new(CircuitBreakerRegistry::from_endpoints(&config.endpoints));
        let http: Arc<dyn DownstreamClient> =
            Arc::new(HttpClient::with_config(config.http.clone().into())?);
        let grpc: Arc<dyn DownstreamClient> = Arc::new(RpcClient::new(config.rpc.clone()));

        let forwarder = Arc::new(Forwarder::new(http, grpc, breakers));
        let engine = Engine::new(
            config.service_name.clone(),
            CpuStressor::from_config(&config.execution),
            NetworkStressor::new(forwarder),
        );

        Ok(Self::new(config, engine))
    }

    pub fn engine(&self) -> &Engine {
        &self.inner.engine
    }

    pub fn service_name(&self) -> &str {
        self.inner.engine.service_name()
    }

    pub fn logging_enabled(&self) -> bool {
        self.inner.logging
    }

    pub fn endpoint(&self, name: &str) -> Option<&EndpointDefinition> {
        self.inner.endpoints.get(name)
    }

    /// Endpoint served as `/emulator.{service}/{method}`
    pub fn grpc_endpoint(&self, service: &str, method: &str) -> Option<&EndpointDefinition> {
        if service != self.inner.grpc_service {
            return None;
        }
        self.inner
            .grpc_methods
            .get(method)
            .and_then(|name| self.endpoint(name))
    }

    /// Execute an endpoint for one inbound call, tracing it when enabled
    pub async fn handle(
        &self,
        context: &dyn RequestContext,
        endpoint: &EndpointDefinition,
    ) -> AggregatedResponse {
        let trace = EndpointTrace::start(self.logging_enabled(), self.service_name(), endpoint);
        let response = self.engine().execute(context, endpoint).await;

        if let Some(trace) = trace {
            trace.finish();
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emulator_core::EndpointDefinition;

    fn config() -> EmulatorConfig {
        EmulatorConfig {
            service_name: "svc-a".to_string(),
            endpoints: vec![EndpointDefinition::new("get-user"), EndpointDefinition::new("ep1")],
            ..Default::default()
        }
    }

    #[test]
    fn test_grpc_lookup_uses_pascal_case_names() {
        let state = AppState::from_config(&config()).unwrap();

        assert_eq!(state.grpc_endpoint("SvcA", "GetUser").unwrap().name, "get-user");
        assert_eq!(state.grpc_endpoint("SvcA", "Ep1").unwrap().name, "ep1");
        assert!(state.grpc_endpoint("SvcB", "Ep1").is_none());
        assert!(state.grpc_endpoint("SvcA", "Missing").is_none());
    }

    #[test]
    fn test_endpoint_lookup_by_name() {
        let state = AppState::from_config(&config()).unwrap();

        assert!(state.endpoint("ep1").is_some());
        assert!(state.endpoint("Ep1").is_none());
        assert_eq!(state.service_name(), "svc-a");
    }
}
