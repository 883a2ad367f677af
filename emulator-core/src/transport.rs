//! Downstream transport seam used by the forwarder

use crate::model::{CalledServiceRef, Protocol};
use crate::response::AggregatedResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Body of an inbound or outbound endpoint call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRequest {
    #[serde(default)]
    pub payload: String,
}

/// One outbound call, fully prepared by the forwarder
#[derive(Debug, Clone)]
pub struct DownstreamCall {
    /// Endpoint on whose behalf the call is made
    pub source_endpoint: String,
    pub target: CalledServiceRef,
    pub payload: String,
    /// Propagated tracing headers
    pub headers: Vec<(String, String)>,
}

/// Successful transport exchange
#[derive(Debug, Clone)]
pub struct TransportReply {
    /// `"200 OK"` style for HTTP, status code name for gRPC
    pub status: String,
    pub body: AggregatedResponse,
}

/// Failed transport exchange; the text becomes the route status
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}")]
pub struct TransportError {
    pub status: String,
}

impl TransportError {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

/// Client for one downstream protocol
#[async_trait]
pub trait DownstreamClient: Send + Sync {
    fn protocol(&self) -> Protocol;

    /// Deadline of calls on routes without a circuit breaker
    fn default_timeout(&self) -> Duration;

    /// Issue the call. Deadlines are applied by the caller.
    async fn send(&self, call: &DownstreamCall) -> Result<TransportReply, TransportError>;

    /// Synthetic error returned when a circuit breaker rejects or times out a call
    fn unavailable(&self) -> TransportError;

    /// Error returned when an unprotected call exceeds the default deadline
    fn deadline_exceeded(&self) -> TransportError;
}
