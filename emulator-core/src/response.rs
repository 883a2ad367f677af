//! Response tree returned by every emulated endpoint
//!
//! The tree is flat per request: each hop merges the already-flattened
//! subtrees of its downstream calls into its own [`TaskResponses`] before
//! replying. The merge operations defined here form the algebra used by the
//! response aggregator.

use crate::model::{CalledServiceRef, Protocol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wire response body of an endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResponse {
    #[serde(rename = "endpoint", default, skip_serializing_if = "String::is_empty")]
    pub endpoint_name: String,

    #[serde(rename = "tasks", default, skip_serializing_if = "Option::is_none")]
    pub task_results: Option<TaskResponses>,

    #[serde(rename = "message", default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AggregatedResponse {
    pub fn new(endpoint_name: impl Into<String>, task_results: TaskResponses) -> Self {
        Self {
            endpoint_name: endpoint_name.into(),
            task_results: Some(task_results),
            error_message: None,
        }
    }

    /// Response for an endpoint that is not served by this service
    pub fn not_found(endpoint_name: impl Into<String>) -> Self {
        let endpoint_name = endpoint_name.into();
        Self {
            error_message: Some(format!("Endpoint {} doesn't exist", endpoint_name)),
            endpoint_name,
            task_results: None,
        }
    }
}

/// Statistics of all tasks executed on behalf of one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResponses {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_task: Option<CpuTaskResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_task: Option<NetworkTaskResult>,
}

impl TaskResponses {
    /// Absorb one task result into this tree
    pub fn apply(&mut self, result: TaskResult) {
        match result {
            TaskResult::Cpu(cpu) => match self.cpu_task.as_mut() {
                Some(existing) => existing.absorb(cpu),
                None => self.cpu_task = Some(cpu),
            },
            TaskResult::Network(network) => match self.network_task.as_mut() {
                Some(existing) => existing.absorb(network),
                None => self.network_task = Some(network),
            },
        }
    }

    /// Split into the task results it carries
    pub fn into_results(self) -> impl Iterator<Item = TaskResult> {
        self.cpu_task
            .map(TaskResult::Cpu)
            .into_iter()
            .chain(self.network_task.map(TaskResult::Network))
    }

    pub fn is_empty(&self) -> bool {
        self.cpu_task.is_none() && self.network_task.is_none()
    }
}

/// CPU seconds consumed per `"{service}/{endpoint}"`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuTaskResult {
    #[serde(rename = "services", default)]
    pub services_consumed: BTreeMap<String, f64>,
}

impl CpuTaskResult {
    pub fn single(label: impl Into<String>, seconds: f64) -> Self {
        let mut services_consumed = BTreeMap::new();
        services_consumed.insert(label.into(), seconds);
        Self { services_consumed }
    }

    /// Map union; a duplicate label keeps the incoming value
    pub fn absorb(&mut self, other: CpuTaskResult) {
        self.services_consumed.extend(other.services_consumed);
    }
}

/// Status of the last observed call on one route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub protocol: String,
    pub status: String,
}

impl RouteResponse {
    pub fn new(protocol: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            status: status.into(),
        }
    }

    /// 2xx for HTTP, `OK` for gRPC
    pub fn is_success(&self) -> bool {
        if self.protocol.eq_ignore_ascii_case(Protocol::Grpc.label()) {
            self.status == "OK"
        } else {
            self.status.starts_with('2')
        }
    }

    /// Combine two observations of the same route.
    ///
    /// A failure dominates a success; equal classes fall back to the larger
    /// `(protocol, status)` pair. The result does not depend on argument order.
    pub fn join(self, other: RouteResponse) -> RouteResponse {
        let rank = |r: &RouteResponse| (!r.is_success(), r.protocol.clone(), r.status.clone());
        if rank(&other) > rank(&self) {
            other
        } else {
            self
        }
    }
}

/// Services visited and route statuses observed by the network stressors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkTaskResult {
    #[serde(rename = "services", default)]
    pub services_visited: Vec<String>,

    #[serde(rename = "responses", default)]
    pub responses_by_route: BTreeMap<String, RouteResponse>,

    #[serde(default)]
    pub payload: String,
}

impl NetworkTaskResult {
    pub fn new(label: impl Into<String>, payload: String) -> Self {
        Self {
            services_visited: vec![label.into()],
            responses_by_route: BTreeMap::new(),
            payload,
        }
    }

    /// Record one route status, joined with any earlier status of the route
    pub fn record_route(&mut self, route: String, response: RouteResponse) {
        let joined = match self.responses_by_route.remove(&route) {
            Some(existing) => existing.join(response),
            None => response,
        };
        self.responses_by_route.insert(route, joined);
    }

    /// Append visited services and join route statuses.
    ///
    /// The incoming payload is discarded: the payload already present is the
    /// node's own and is set exactly once.
    pub fn absorb(&mut self, other: NetworkTaskResult) {
        self.services_visited.extend(other.services_visited);
        for (route, response) in other.responses_by_route {
            self.record_route(route, response);
        }
    }
}

/// Closed union of the results a stressor can produce
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    Cpu(CpuTaskResult),
    Network(NetworkTaskResult),
}

/// Normalised outcome of one downstream call
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointCallResult {
    /// `"200 OK"` style for HTTP, status code name for gRPC, error text on failure
    pub status: String,
    pub protocol: Protocol,
    pub called_service: CalledServiceRef,
    /// `None` on transport error
    pub response_data: Option<AggregatedResponse>,
}

impl EndpointCallResult {
    pub fn success(called_service: CalledServiceRef, status: String, body: AggregatedResponse) -> Self {
        Self {
            status,
            protocol: called_service.protocol,
            called_service,
            response_data: Some(body),
        }
    }

    pub fn failure(called_service: CalledServiceRef, status: String) -> Self {
        Self {
            status,
            protocol: called_service.protocol,
            called_service,
            response_data: None,
        }
    }

    pub fn route_label(&self) -> String {
        self.called_service.route_label()
    }

    pub fn route_response(&self) -> RouteResponse {
        RouteResponse::new(self.protocol.label(), self.status.clone())
    }
}
