//! Service Emulator Execution Engine
//!
//! For a single inbound request the engine burns the configured amount of
//! CPU time, fans out to the configured downstream endpoints through
//! per-route circuit breakers, and merges the statistics returned by every
//! downstream call into one aggregate response tree.

pub mod aggregator;
pub mod cpu;
pub mod engine;
pub mod error;
pub mod forwarder;
pub mod network;
pub mod payload;

// Re-export main types
pub use aggregator::AggregationState;
pub use cpu::{BusyLoop, CalibratedSleep, CpuStrategy, CpuStressor};
pub use engine::Engine;
pub use error::{ExecutionError, ExecutionResult};
pub use forwarder::Forwarder;
pub use network::NetworkStressor;
pub use payload::random_payload;
