//! Forwarder
//!
//! Expands the configured downstream routes by their traffic ratio and issues
//! one call per expansion, either one after another or all at once. Every
//! call is guarded by the route's circuit breaker when one is registered, or
//! by the client's default deadline otherwise. Failures become call results,
//! never errors.

use crate::payload::random_payload;
use emulator_core::{
    CalledServiceRef, DownstreamCall, DownstreamClient, EndpointCallResult, ForwardMode, Protocol,
    RequestContext,
};
use emulator_resilience::CircuitBreakerRegistry;
use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

pub struct Forwarder {
    http: Arc<dyn DownstreamClient>,
    grpc: Arc<dyn DownstreamClient>,
    breakers: Arc<CircuitBreakerRegistry>,
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder")
            .field("breakers", &self.breakers.routes())
            .finish()
    }
}

impl Forwarder {
    pub fn new(
        http: Arc<dyn DownstreamClient>,
        grpc: Arc<dyn DownstreamClient>,
        breakers: Arc<CircuitBreakerRegistry>,
    ) -> Self {
        Self {
            http,
            grpc,
            breakers,
        }
    }

    pub fn breakers(&self) -> &CircuitBreakerRegistry {
        &self.breakers
    }

    fn client(&self, protocol: Protocol) -> &dyn DownstreamClient {
        match protocol {
            Protocol::Http => self.http.as_ref(),
            Protocol::Grpc => self.grpc.as_ref(),
        }
    }

    /// Call every route `traffic_forward_ratio` times.
    ///
    /// Results are returned in expansion order whatever the mode: in parallel
    /// mode each call fills its own slot, and the join waits for all of them.
    pub async fn forward(
        &self,
        context: &dyn RequestContext,
        source_endpoint: &str,
        called_services: &[CalledServiceRef],
        mode: ForwardMode,
    ) -> Vec<EndpointCallResult> {
        let headers = context.propagated_headers();
        let targets: Vec<&CalledServiceRef> = called_services
            .iter()
            .flat_map(|target| std::iter::repeat(target).take(target.traffic_forward_ratio))
            .collect();

        debug!(
            "{} forwarding {} calls ({:?})",
            source_endpoint,
            targets.len(),
            mode
        );

        if mode.is_parallel() {
            join_all(
                targets
                    .into_iter()
                    .map(|target| self.call(source_endpoint, target, &headers)),
            )
            .await
        } else {
            let mut results = Vec::with_capacity(targets.len());
            for target in targets {
                results.push(self.call(source_endpoint, target, &headers).await);
            }
            results
        }
    }

    async fn call(
        &self,
        source_endpoint: &str,
        target: &CalledServiceRef,
        headers: &[(String, String)],
    ) -> EndpointCallResult {
        let client = self.client(target.protocol);
        let call = DownstreamCall {
            source_endpoint: source_endpoint.to_string(),
            target: target.clone(),
            payload: random_payload(target.request_payload_size),
            headers: headers.to_vec(),
        };

        let outcome = match self
            .breakers
            .get(source_endpoint, &target.service, &target.endpoint)
        {
            Some(breaker) => breaker.guard(|| client.send(&call), client.unavailable()).await,
            None => tokio::time::timeout(client.default_timeout(), client.send(&call))
                .await
                .unwrap_or_else(|_| Err(client.deadline_exceeded())),
        };

        match outcome {
            Ok(reply) => {
                debug!("{} -> {}: {}", source_endpoint, target.route_label(), reply.status);
                EndpointCallResult::success(call.target, reply.status, reply.body)
            }
            Err(error) => {
                debug!("{} -> {} failed: {}", source_endpoint, target.route_label(), error);
                EndpointCallResult::failure(call.target, error.status)
            }
        }
    }
}
