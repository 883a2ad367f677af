use emulator_http::HttpError;
use thiserror::Error;

/// Errors raised while starting or running the listeners
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] HttpError),
}
