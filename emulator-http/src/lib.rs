//! HTTP downstream client for the service emulator
//!
//! Issues `POST http://{service}[:{port}]/{endpoint}` with a JSON
//! `{"payload": ...}` body, forwards the propagated tracing headers and
//! decodes the reply into an `AggregatedResponse`.

pub mod client;
pub mod config;
pub mod errors;

// Re-export main types for convenience
pub use client::HttpClient;
pub use config::HttpConfig;
pub use errors::HttpError;
