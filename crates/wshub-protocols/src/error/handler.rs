//! Application handler errors.

use thiserror::Error;

use super::ChannelError;

/// Error returned by an application lifecycle handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Handler failed: {0}")]
    Failed(String),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
