//! Transport adapter errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Listen address could not be parsed.
    #[error("Invalid address {addr}: {reason}")]
    InvalidAddress { addr: String, reason: String },

    /// Binding the listener failed.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The server loop exited with an error.
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}
