//! Channel errors.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Channel closed")]
    Closed,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Ping failed: {0}")]
    PingFailed(String),

    #[error("Close failed: {0}")]
    CloseFailed(String),
}
