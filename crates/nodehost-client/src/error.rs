//! Error types for nodehost client operations

use thiserror::Error;

use crate::streaming::StreamError;

/// Result type alias for nodehost client operations
pub type Result<T> = std::result::Result<T, NodehostError>;

/// Errors that can occur during nodehost client operations
#[derive(Error, Debug)]
pub enum NodehostError {
    /// Missing or invalid process-wide configuration (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server returned an error response
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Failed to parse a response body
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Request signing failed
    #[error("Signing error: {0}")]
    Signing(String),

    /// Streaming error
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
}

impl NodehostError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
