//! Error types for request execution

use thiserror::Error;

/// Execution errors
///
/// Downstream failures never show up here: they are recorded as route
/// statuses in the response tree. These variants cover process-level faults
/// of the CPU stressor.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Failed to spawn CPU worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    #[error("CPU worker panicked")]
    WorkerPanicked,

    #[error("CPU task failed to complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;
