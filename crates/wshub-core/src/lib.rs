//! # wshub Core
//!
//! The connection registry and everything with a concurrency obligation:
//!
//! - [`ConnectionManager`] - id → connection map with unicast send and
//!   broadcast-with-exclusion
//! - [`HeartbeatSupervisor`] - per-connection periodic liveness probes,
//!   disarmed in the same call that removes a connection
//! - [`Hub`] - routes transport lifecycle events to a [`ConnectionHandler`]
//!
//! ## Flow
//!
//! ```text
//! transport upgrade ─▶ Hub::connect ─▶ ConnectionManager::add_connection ─▶ on_connect
//! text frame        ─▶ Hub::message ─▶ Envelope::parse ─▶ on_message | on_error
//! socket close      ─▶ Hub::disconnect ─▶ heartbeat disarm + remove ─▶ on_disconnect
//! ```
//!
//! The registry is an explicitly constructed value. Share it with an `Arc`
//! between the transport adapter and application handlers.

mod connection;
mod handler;
mod heartbeat;
mod hub;
mod manager;

#[cfg(test)]
mod test_support;

pub use connection::{Connection, ConnectionId};
pub use handler::{ConnectionHandler, NoopHandler};
pub use heartbeat::{HeartbeatConfig, HeartbeatSupervisor};
pub use hub::Hub;
pub use manager::{BroadcastReport, ConnectionManager};

pub use wshub_protocols::{
    now_millis, Channel, ChannelError, ChannelState, ConnectionError, Envelope, HandlerError,
    Metadata, ProtocolError,
};
