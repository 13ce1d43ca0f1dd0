//! Error types for the analysis client

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    #[error("Connection to {addr} failed: {source}")]
    ConnectionFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not connected to a session")]
    NotConnected,

    #[error("Connection closed by the server")]
    ConnectionClosed,

    #[error("Malformed message from server: {0}")]
    Protocol(String),

    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server answered with HTTP {0}")]
    HttpStatus(u16),

    #[error("Mock response not configured for: {0}")]
    NotConfigured(String),
}

impl ClientError {
    /// Whether the underlying connection is unusable after this error.
    /// A malformed frame leaves the stream intact.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Protocol(_) | Self::Encode(_) | Self::NotConfigured(_))
    }
}
