//! Inbound request capabilities seen by the execution engine

use crate::model::Protocol;
use std::collections::HashMap;

/// Headers copied from an HTTP-sourced inbound request onto every downstream call
pub const PROPAGATED_HEADERS: [&str; 8] = [
    "User-Agent",
    "End-User",
    "X-Request-Id",
    "X-B3-TraceId",
    "X-B3-SpanId",
    "X-B3-ParentSpanId",
    "X-B3-Sampled",
    "X-B3-Flags",
];

/// What the engine may ask of the inbound request, implemented once per transport
pub trait RequestContext: Send + Sync {
    /// Transport the inbound request arrived on
    fn origin_protocol(&self) -> Protocol;

    /// Header or metadata value, matched case-insensitively
    fn header(&self, name: &str) -> Option<String>;

    /// Allow-listed tracing headers to forward; empty unless the request is HTTP-sourced
    fn propagated_headers(&self) -> Vec<(String, String)> {
        if self.origin_protocol() != Protocol::Http {
            return Vec::new();
        }

        PROPAGATED_HEADERS
            .iter()
            .filter_map(|name| {
                self.header(name)
                    .filter(|value| !value.is_empty())
                    .map(|value| (name.to_string(), value))
            })
            .collect()
    }
}

/// Request context backed by an owned header map
#[derive(Debug, Clone, Default)]
pub struct StaticRequestContext {
    origin: Protocol,
    headers: HashMap<String, String>,
}

impl StaticRequestContext {
    pub fn new(origin: Protocol) -> Self {
        Self {
            origin,
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }
}

impl RequestContext for StaticRequestContext {
    fn origin_protocol(&self) -> Protocol {
        self.origin
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_ascii_lowercase()).cloned()
    }
}
