//! Transport channel protocol.
//!
//! A [`Channel`] is the registry's handle on one underlying socket. The
//! transport adapter owns the actual I/O; every method here is a
//! non-blocking enqueue or state query.

use crate::error::ChannelError;

/// Ready state of a transport channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    /// Handshake not yet complete.
    Connecting,
    /// Frames may be written.
    Open,
    /// Close requested, not yet acknowledged.
    Closing,
    /// Socket is gone.
    Closed,
}

impl ChannelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "open",
            ChannelState::Closing => "closing",
            ChannelState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a transport socket.
pub trait Channel: Send + Sync {
    /// Current ready state.
    fn state(&self) -> ChannelState;

    /// Whether frames may be written right now.
    fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Enqueue a UTF-8 text frame.
    fn send_text(&self, frame: String) -> Result<(), ChannelError>;

    /// Enqueue a liveness probe.
    fn ping(&self, payload: Vec<u8>) -> Result<(), ChannelError>;

    /// Request the socket be closed.
    fn close(&self) -> Result<(), ChannelError>;
}
