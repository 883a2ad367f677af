//! Core domain models and types for the service emulator
//!
//! This crate contains the endpoint model loaded from configuration, the
//! response tree returned by every emulated endpoint, and the seams used by
//! the execution engine to talk to inbound transports and downstream
//! services. It has minimal dependencies and defines the domain language of
//! the emulator.

pub mod context;
pub mod model;
pub mod response;
pub mod transport;

// Re-export commonly used types at the crate root
pub use context::{RequestContext, StaticRequestContext, PROPAGATED_HEADERS};
pub use model::{
    CalledServiceRef, CircuitBreakerSettings, CpuComplexity, EndpointDefinition, ExecutionMode,
    ForwardMode, NetworkComplexity, Protocol,
};
pub use response::{
    AggregatedResponse, CpuTaskResult, EndpointCallResult, NetworkTaskResult, RouteResponse,
    TaskResponses, TaskResult,
};
pub use transport::{
    DownstreamCall, DownstreamClient, EndpointRequest, TransportError, TransportReply,
};
