//! Inbound request contexts of both listeners

use axum::http::HeaderMap;
use emulator_core::{Protocol, RequestContext};
use tonic::metadata::MetadataMap;

/// Context of a call received on the HTTP listener
#[derive(Debug, Clone, Default)]
pub struct HttpRequestContext {
    headers: HeaderMap,
}

impl HttpRequestContext {
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }
}

impl RequestContext for HttpRequestContext {
    fn origin_protocol(&self) -> Protocol {
        Protocol::Http
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }
}

/// Context of a call received on the gRPC listener
///
/// Metadata is readable but never propagated downstream.
#[derive(Debug, Clone, Default)]
pub struct GrpcRequestContext {
    metadata: MetadataMap,
}

impl GrpcRequestContext {
    pub fn new(metadata: MetadataMap) -> Self {
        Self { metadata }
    }
}

impl RequestContext for GrpcRequestContext {
    fn origin_protocol(&self) -> Protocol {
        Protocol::Grpc
    }

    fn header(&self, name: &str) -> Option<String> {
        self.metadata
            .get(name.to_ascii_lowercase().as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }
}
