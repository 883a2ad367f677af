//! gRPC error types

use crate::convert::code_name;
use emulator_core::TransportError;
use tonic::Code;

/// Error type for gRPC operations
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("Invalid target {0}")]
    InvalidTarget(String),

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Invalid metadata {0}")]
    InvalidMetadata(String),

    #[error("Call failed: {0}")]
    Status(#[from] tonic::Status),
}

impl RpcError {
    /// Status code the failure is reported as
    pub fn code(&self) -> Code {
        match self {
            RpcError::InvalidTarget(_) => Code::Unknown,
            RpcError::Transport(_) => Code::Unavailable,
            RpcError::InvalidMetadata(_) => Code::Internal,
            RpcError::Status(status) => status.code(),
        }
    }
}

impl From<RpcError> for TransportError {
    fn from(error: RpcError) -> Self {
        TransportError::new(code_name(error.code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_becomes_route_status() {
        let error = RpcError::from(tonic::Status::invalid_argument("bad"));
        assert_eq!(TransportError::from(error).status, "InvalidArgument");
    }
}
