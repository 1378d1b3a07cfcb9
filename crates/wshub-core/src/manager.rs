//! Connection registry.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, error, info, warn};

use wshub_protocols::{Channel, Envelope, Metadata};

use crate::connection::{Connection, ConnectionId};
use crate::heartbeat::{HeartbeatConfig, HeartbeatSupervisor};

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;

/// Outcome of [`ConnectionManager::broadcast_counted`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Frames handed to a channel without error.
    pub delivered: usize,
    /// Recipients skipped because they were excluded or not open.
    pub skipped: usize,
    /// Recipients whose channel rejected the write.
    pub failed: Vec<ConnectionId>,
}

/// Registry of live connections, keyed by [`ConnectionId`].
///
/// Safe to share across tasks and threads. No operation awaits; channel
/// writes are enqueued and the call returns.
pub struct ConnectionManager<M = Metadata> {
    connections: DashMap<ConnectionId, Arc<Connection<M>>>,
    heartbeat: Option<HeartbeatSupervisor>,
}

impl<M> ConnectionManager<M>
where
    M: Send + Sync + 'static,
{
    /// Registry without heartbeat supervision.
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            heartbeat: None,
        }
    }

    /// Registry that arms a heartbeat for every added connection.
    pub fn with_heartbeat(config: HeartbeatConfig) -> Self {
        Self {
            connections: DashMap::new(),
            heartbeat: Some(HeartbeatSupervisor::new(config)),
        }
    }

    pub fn heartbeat(&self) -> Option<&HeartbeatSupervisor> {
        self.heartbeat.as_ref()
    }

    /// Register a channel under a freshly generated id.
    pub fn add_connection<C>(&self, channel: C, metadata: M) -> Arc<Connection<M>>
    where
        C: Channel + 'static,
    {
        let conn = Arc::new(Connection::new(Box::new(channel), metadata));

        // Arm before the id is visible so a concurrent remove always finds
        // the timer.
        if let Some(heartbeat) = &self.heartbeat {
            heartbeat.arm(&conn);
        }
        self.connections
            .insert(conn.id().to_string(), Arc::clone(&conn));

        debug!(connection_id = %conn.id(), total = self.size(), "Connection added");
        conn
    }

    /// Independent copy of the current membership.
    pub fn get_connections(&self) -> HashMap<ConnectionId, Arc<Connection<M>>> {
        self.connections
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    pub fn get_connection(&self, id: &str) -> Option<Arc<Connection<M>>> {
        self.connections.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(|e| e.key().clone()).collect()
    }

    /// Send to one connection.
    ///
    /// Returns `false` if the id is unknown, the channel is not open, or the
    /// write failed. A failed write is logged and leaves the connection
    /// registered.
    pub fn send(&self, id: &str, envelope: &Envelope) -> bool {
        let Some(conn) = self.get_connection(id) else {
            debug!(connection_id = %id, "Send to unknown connection");
            return false;
        };

        if !conn.channel().is_open() {
            debug!(
                connection_id = %id,
                state = %conn.channel().state(),
                "Send to connection that is not open"
            );
            return false;
        }

        write_envelope(&conn, envelope)
    }

    /// Send to every open connection not in `exclude`.
    ///
    /// Per-recipient failures are logged and do not stop delivery to the
    /// rest. Connections added after the call starts are not included.
    pub fn broadcast(&self, envelope: &Envelope, exclude: &[&str]) {
        let report = self.broadcast_counted(envelope, exclude);
        if !report.failed.is_empty() {
            warn!(
                kind = %envelope.kind,
                failed = report.failed.len(),
                delivered = report.delivered,
                "Broadcast partially failed"
            );
        }
    }

    /// [`broadcast`](Self::broadcast) that reports what happened.
    pub fn broadcast_counted(&self, envelope: &Envelope, exclude: &[&str]) -> BroadcastReport {
        let snapshot: Vec<Arc<Connection<M>>> = self
            .connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut report = BroadcastReport::default();
        for conn in snapshot {
            if exclude.iter().any(|id| *id == conn.id()) || !conn.channel().is_open() {
                report.skipped += 1;
                continue;
            }

            if write_envelope(&conn, envelope) {
                report.delivered += 1;
            } else {
                report.failed.push(conn.id().to_string());
            }
        }

        debug!(
            kind = %envelope.kind,
            delivered = report.delivered,
            skipped = report.skipped,
            "Broadcast complete"
        );
        report
    }

    /// Drop the registry entry without touching the channel.
    pub fn remove_connection(&self, id: &str) -> bool {
        let removed = self.connections.remove(id).is_some();
        if let Some(heartbeat) = &self.heartbeat {
            heartbeat.disarm(id);
        }

        if removed {
            debug!(connection_id = %id, total = self.size(), "Connection removed");
        }
        removed
    }

    /// Close the channel and drop the registry entry.
    ///
    /// Returns `false` if the id is unknown or the close failed; a failed
    /// close leaves the entry registered.
    pub fn disconnect(&self, id: &str) -> bool {
        let Some(conn) = self.get_connection(id) else {
            return false;
        };

        if let Err(e) = conn.channel().close() {
            error!(connection_id = %id, "Failed to close connection: {}", e);
            return false;
        }

        self.remove_connection(id);
        info!(connection_id = %id, "Connection disconnected");
        true
    }

    pub fn size(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Cancel all heartbeats, close every channel and empty the registry.
    ///
    /// Close failures are logged per connection. Returns how many
    /// connections were removed.
    pub fn clear(&self) -> usize {
        if let Some(heartbeat) = &self.heartbeat {
            heartbeat.disarm_all();
        }

        let mut cleared = 0;
        loop {
            let ids = self.ids();
            if ids.is_empty() {
                break;
            }

            for id in ids {
                let Some((_, conn)) = self.connections.remove(&id) else {
                    continue;
                };
                if let Some(heartbeat) = &self.heartbeat {
                    heartbeat.disarm(&id);
                }
                if let Err(e) = conn.channel().close() {
                    warn!(connection_id = %id, "Failed to close connection during clear: {}", e);
                }
                cleared += 1;
            }
        }

        info!(cleared, "Connection registry cleared");
        cleared
    }
}

impl<M> Default for ConnectionManager<M>
where
    M: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn write_envelope<M>(conn: &Connection<M>, envelope: &Envelope) -> bool {
    let frame = match envelope.to_stamped_frame() {
        Ok(frame) => frame,
        Err(e) => {
            error!(connection_id = %conn.id(), "Failed to serialize message: {}", e);
            return false;
        }
    };

    match conn.channel().send_text(frame) {
        Ok(()) => true,
        Err(e) => {
            warn!(connection_id = %conn.id(), "Failed to send message: {}", e);
            false
        }
    }
}
