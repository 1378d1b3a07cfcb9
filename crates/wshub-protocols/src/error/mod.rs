//! Error types for the wshub protocol layer.

mod channel;
mod connection;
mod handler;
mod protocol;

pub use channel::*;
pub use connection::*;
pub use handler::*;
pub use protocol::*;
