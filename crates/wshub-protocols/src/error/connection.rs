//! Per-connection errors delivered to `on_error`.

use thiserror::Error;

use super::{HandlerError, ProtocolError};

/// Anything that went wrong on a single connection.
///
/// None of these close the connection by themselves.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Inbound frame could not be decoded as an envelope.
    #[error("Decode error: {0}")]
    Decode(#[from] ProtocolError),

    /// The transport reported an error on the socket.
    #[error("Transport error: {0}")]
    Transport(String),

    /// `on_message` returned an error.
    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),
}

impl ConnectionError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_from_protocol_error() {
        let err = ConnectionError::from(ProtocolError::InvalidJson("eof".to_string()));
        assert!(err.is_decode());
        assert!(err.to_string().contains("Decode error"));
    }

    #[test]
    fn test_transport_helper() {
        let err = ConnectionError::transport("reset by peer");
        assert!(!err.is_decode());
        assert!(err.to_string().contains("reset by peer"));
    }

    #[test]
    fn test_handler_from() {
        let err = ConnectionError::from(HandlerError::failed("boom"));
        assert!(err.to_string().contains("Handler error"));
        assert!(err.to_string().contains("boom"));
    }
}
