//! Listeners of the service emulator
//!
//! The HTTP listener serves every configured endpoint at `/{endpoint}`; the
//! gRPC listener serves it as the unary method
//! `/emulator.{Service}/{Endpoint}`. Both hand the call to the shared
//! execution engine and reply with the aggregated response tree.

pub mod context;
pub mod error;
pub mod grpc;
pub mod http;
pub mod startup;
pub mod state;

pub use context::{GrpcRequestContext, HttpRequestContext};
pub use error::ServerError;
pub use startup::{build_id_matches, shutdown_signal, BoundServer, Server, BUILD_ID};
pub use state::AppState;
