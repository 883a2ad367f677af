//! Network stressor

use crate::aggregator::AggregationState;
use crate::forwarder::Forwarder;
use crate::payload::random_payload;
use emulator_core::{NetworkComplexity, NetworkTaskResult, RequestContext, TaskResult};
use std::sync::Arc;
use tracing::debug;

/// Generates the response payload and forwards to the downstream routes
#[derive(Debug, Clone)]
pub struct NetworkStressor {
    forwarder: Arc<Forwarder>,
}

impl NetworkStressor {
    pub fn new(forwarder: Arc<Forwarder>) -> Self {
        Self { forwarder }
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    /// Run the network task of `endpoint_name`, labelled `label`, into `state`
    pub async fn run(
        &self,
        context: &dyn RequestContext,
        endpoint_name: &str,
        label: &str,
        network: &NetworkComplexity,
        state: &AggregationState,
    ) {
        let calls = self
            .forwarder
            .forward(
                context,
                endpoint_name,
                &network.called_services,
                network.forward_requests,
            )
            .await;

        let failed = calls
            .iter()
            .filter(|call| !call.route_response().is_success())
            .count();
        debug!(
            "Network task {}: {} calls, {} failed, payload {} bytes",
            label,
            calls.len(),
            failed,
            network.response_payload_size
        );

        let own = NetworkTaskResult::new(label, random_payload(network.response_payload_size));
        state.merge(TaskResult::Network(own), calls);
    }
}
