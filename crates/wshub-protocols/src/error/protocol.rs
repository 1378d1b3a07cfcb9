//! Envelope encode/decode errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid message shape: {0}")]
    InvalidShape(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
