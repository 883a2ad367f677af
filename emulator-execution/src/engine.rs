//! Execution orchestrator

use crate::aggregator::AggregationState;
use crate::cpu::CpuStressor;
use crate::error::ExecutionResult;
use crate::network::NetworkStressor;
use emulator_core::{
    AggregatedResponse, CpuComplexity, CpuTaskResult, EndpointDefinition, ExecutionMode,
    RequestContext, TaskResult,
};
use tracing::{debug, error};

/// Executes the stressors of an endpoint for one inbound request
#[derive(Debug, Clone)]
pub struct Engine {
    service_name: String,
    cpu: CpuStressor,
    network: NetworkStressor,
}

impl Engine {
    pub fn new(service_name: impl Into<String>, cpu: CpuStressor, network: NetworkStressor) -> Self {
        Self {
            service_name: service_name.into(),
            cpu,
            network,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn network(&self) -> &NetworkStressor {
        &self.network
    }

    /// `"{service}/{endpoint}"`
    pub fn label(&self, endpoint: &EndpointDefinition) -> String {
        format!("{}/{}", self.service_name, endpoint.name)
    }

    /// Run every applicable stressor and return the merged tree.
    ///
    /// Sequential endpoints run the CPU task to completion before the network
    /// task; parallel endpoints run both concurrently and join them. Never
    /// fails: downstream failures are recorded as route statuses.
    pub async fn execute(
        &self,
        context: &dyn RequestContext,
        endpoint: &EndpointDefinition,
    ) -> AggregatedResponse {
        let state = AggregationState::new();

        match endpoint.execution_mode {
            ExecutionMode::Sequential => {
                self.run_cpu(endpoint, &state).await;
                self.run_network(context, endpoint, &state).await;
            }
            ExecutionMode::Parallel => {
                tokio::join!(
                    self.run_cpu(endpoint, &state),
                    self.run_network(context, endpoint, &state)
                );
            }
        }

        AggregatedResponse::new(endpoint.name.clone(), state.into_responses())
    }

    async fn run_cpu(&self, endpoint: &EndpointDefinition, state: &AggregationState) {
        let Some(cpu) = &endpoint.cpu_complexity else {
            return;
        };

        let label = self.label(endpoint);
        match self.stress_cpu(cpu).await {
            Ok(()) => {
                debug!(
                    "CPU task {}: {}s on {} threads",
                    label, cpu.execution_time, cpu.threads
                );
                state.merge(
                    TaskResult::Cpu(CpuTaskResult::single(label, cpu.execution_time)),
                    Vec::new(),
                );
            }
            Err(e) => error!("CPU task {} failed: {}", label, e),
        }
    }

    async fn stress_cpu(&self, cpu: &CpuComplexity) -> ExecutionResult<()> {
        let stressor = self.cpu.clone();
        let (execution_time, threads) = (cpu.execution_time, cpu.threads);

        // The busy loop blocks its thread for the whole budget
        tokio::task::spawn_blocking(move || stressor.run(execution_time, threads)).await?
    }

    async fn run_network(
        &self,
        context: &dyn RequestContext,
        endpoint: &EndpointDefinition,
        state: &AggregationState,
    ) {
        if let Some(network) = &endpoint.network_complexity {
            let label = self.label(endpoint);
            self.network
                .run(context, &endpoint.name, &label, network, state)
                .await;
        }
    }
}
