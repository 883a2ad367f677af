//! Per-request call trace

use crate::clock::process_cpu_time;
use emulator_core::EndpointDefinition;
use std::time::{Duration, Instant};
use tracing::info;

/// Response time and process CPU time of one inbound call
#[derive(Debug)]
pub struct EndpointTrace {
    label: String,
    started: Instant,
    cpu_at_start: Duration,
}

impl EndpointTrace {
    /// Start tracing a call; `None` when tracing is disabled
    pub fn start(enabled: bool, service_name: &str, endpoint: &EndpointDefinition) -> Option<Self> {
        if !enabled {
            return None;
        }

        Some(Self {
            label: format!(
                "{} {}/{}: {}",
                endpoint.protocol, service_name, endpoint.name, endpoint.execution_mode
            ),
            started: Instant::now(),
            cpu_at_start: process_cpu_time().unwrap_or_default(),
        })
    }

    pub fn response_time(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn cpu_time(&self) -> Duration {
        process_cpu_time()
            .unwrap_or_default()
            .saturating_sub(self.cpu_at_start)
    }

    /// Log the trace line
    pub fn finish(self) {
        info!(
            "{} responseTime={:.6}s cpuTime={:.6}s",
            self.label,
            self.response_time().as_secs_f64(),
            self.cpu_time().as_secs_f64()
        );
    }
}
