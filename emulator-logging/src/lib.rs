//! Logging infrastructure for the service emulator
//!
//! Sets up the global `tracing` subscriber from configuration and provides
//! the per-request [`EndpointTrace`] that reports response time and the CPU
//! time the process spent while serving a call.

pub mod clock;
pub mod init;
pub mod trace;

pub use clock::{process_cpu_time, thread_cpu_time};
pub use init::init_logging_from_config;
pub use trace::EndpointTrace;
