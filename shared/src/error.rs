//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request rejected by the remote service
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Push channel error type
#[derive(Debug, Error)]
pub enum PushError {
    /// Connection failed or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// I/O error on the transport
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame could not be decoded
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

/// Result type for push channel operations
pub type PushResult<T> = Result<T, PushError>;
