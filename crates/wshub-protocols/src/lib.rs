//! # wshub Protocols
//!
//! Core protocol definitions shared by the connection registry and the
//! transport adapters. Contains only types and traits, no I/O.
//!
//! - [`Envelope`] - the JSON message unit exchanged after the handshake
//! - [`Channel`] - the handle a transport gives the registry for one socket
//! - [`Metadata`] - the default application-owned key/value bag

pub mod channel;
pub mod envelope;
pub mod error;
pub mod metadata;

pub use channel::{Channel, ChannelState};
pub use envelope::{now_millis, Envelope};
pub use error::{ChannelError, ConnectionError, HandlerError, ProtocolError};
pub use metadata::Metadata;
