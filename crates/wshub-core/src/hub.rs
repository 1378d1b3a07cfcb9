//! Lifecycle dispatch between a transport adapter and the application.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use wshub_protocols::{Channel, ConnectionError, Envelope, Metadata};

use crate::connection::Connection;
use crate::handler::ConnectionHandler;
use crate::manager::ConnectionManager;

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;

/// Routes transport events into the registry and the application handler.
///
/// A transport adapter calls [`connect`](Hub::connect) once the handshake is
/// done, [`message`](Hub::message) per text frame, [`pong`](Hub::pong) per
/// probe acknowledgment, [`error`](Hub::error) on socket errors and
/// [`disconnect`](Hub::disconnect) once the socket is gone.
pub struct Hub<M = Metadata>
where
    M: Send + Sync + 'static,
{
    manager: Arc<ConnectionManager<M>>,
    handler: Arc<dyn ConnectionHandler<M>>,
}

impl<M> Clone for Hub<M>
where
    M: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<M> Hub<M>
where
    M: Send + Sync + 'static,
{
    pub fn new(manager: Arc<ConnectionManager<M>>, handler: Arc<dyn ConnectionHandler<M>>) -> Self {
        Self { manager, handler }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager<M>> {
        &self.manager
    }

    /// Register a channel and run `on_connect`.
    pub async fn connect<C>(&self, channel: C, metadata: M) -> Arc<Connection<M>>
    where
        C: Channel + 'static,
    {
        let conn = self.manager.add_connection(channel, metadata);
        info!(connection_id = %conn.id(), "WebSocket connected");

        if let Err(e) = self.handler.on_connect(&conn).await {
            error!(connection_id = %conn.id(), "on_connect handler failed: {}", e);
        }
        conn
    }

    /// Decode one inbound text frame and dispatch it.
    ///
    /// Frames that fail to decode go to `on_error` only. The connection stays
    /// open either way.
    pub async fn message(&self, conn: &Arc<Connection<M>>, text: &str) {
        let envelope = match Envelope::parse(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(connection_id = %conn.id(), "Failed to parse message: {}", e);
                self.error(conn, ConnectionError::Decode(e)).await;
                return;
            }
        };

        debug!(connection_id = %conn.id(), kind = %envelope.kind, "Message received");
        if let Err(e) = self.handler.on_message(conn, envelope).await {
            error!(connection_id = %conn.id(), "on_message handler failed: {}", e);
            self.error(conn, ConnectionError::Handler(e)).await;
        }
    }

    /// Record a probe acknowledgment.
    pub fn pong(&self, conn: &Connection<M>) {
        conn.acknowledge_probe();
    }

    /// Report a per-connection error to `on_error`.
    pub async fn error(&self, conn: &Arc<Connection<M>>, error: ConnectionError) {
        warn!(connection_id = %conn.id(), "Connection error: {}", error);
        if let Err(e) = self.handler.on_error(conn, &error).await {
            error!(connection_id = %conn.id(), "on_error handler failed: {}", e);
        }
    }

    /// Tear down after the transport reported close.
    ///
    /// The heartbeat is disarmed and the entry removed before `on_disconnect`
    /// runs. Returns whether an entry was removed.
    pub async fn disconnect(&self, conn: &Arc<Connection<M>>) -> bool {
        let removed = self.manager.remove_connection(conn.id());
        info!(connection_id = %conn.id(), "WebSocket disconnected");

        if let Err(e) = self.handler.on_disconnect(conn).await {
            error!(connection_id = %conn.id(), "on_disconnect handler failed: {}", e);
        }
        removed
    }

    /// Cancel all heartbeats, close all channels and empty the registry.
    pub fn shutdown(&self) -> usize {
        let closed = self.manager.clear();
        info!(closed, "Hub shut down");
        closed
    }
}
