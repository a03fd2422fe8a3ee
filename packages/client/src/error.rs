//! Error types for the signaling client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The relay refused the join (slot occupied, bad parameters)
    #[error("Rejected by server: {0}")]
    Rejected(String),

    /// The server URL cannot carry the join query
    #[error("Invalid server URL '{0}': {1}")]
    InvalidUrl(String, String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Outgoing frame could not be encoded
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}
