//! Error types for faultline

use thiserror::Error;

/// Main error type for the faultline library
///
/// Only construction paths (`Client::new`, `Transport::new`, `init`) return
/// errors. Capture calls are infallible by contract: once a client exists,
/// the worst outcome of any internal fault is an undelivered event.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport error
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for faultline
pub type Result<T> = std::result::Result<T, Error>;
