//! gRPC transport pieces of the service emulator
//!
//! Every emulated endpoint is a unary method `/emulator.{Service}/{Endpoint}`
//! taking a `Request { payload }` and returning the protobuf mirror of the
//! aggregated response. Service and method names are only known from the
//! configuration, so calls go through the generic tonic client with the
//! prost codec instead of generated stubs.

pub mod client;
pub mod convert;
pub mod errors;
pub mod naming;

pub mod pb {
    pub mod emulator {
        include!("generated/emulator.rs");
    }
}

pub use client::RpcClient;
pub use convert::{code_name, from_core_response, into_core_response};
pub use errors::RpcError;
pub use naming::{method_path, pascal_case, split_method_path, PACKAGE};
