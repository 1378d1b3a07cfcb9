//! A registered connection.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use wshub_protocols::{Channel, Metadata};

/// Connection identifier, a hyphenated UUID v4.
pub type ConnectionId = String;

/// One live transport session.
///
/// Only [`ConnectionManager::add_connection`](crate::ConnectionManager::add_connection)
/// creates these. The channel is owned exclusively by the connection, so a
/// socket cannot be registered under two ids.
pub struct Connection<M = Metadata> {
    id: ConnectionId,
    channel: Box<dyn Channel>,
    metadata: RwLock<M>,
    connected_at: DateTime<Utc>,
    /// Probes sent since the last acknowledgment.
    outstanding_probes: AtomicU32,
}

impl<M> Connection<M> {
    pub(crate) fn new(channel: Box<dyn Channel>, metadata: M) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            channel,
            metadata: RwLock::new(metadata),
            connected_at: Utc::now(),
            outstanding_probes: AtomicU32::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn channel(&self) -> &dyn Channel {
        self.channel.as_ref()
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Clone of the current metadata.
    pub fn metadata(&self) -> M
    where
        M: Clone,
    {
        self.metadata.read().clone()
    }

    /// Read metadata without cloning it.
    pub fn with_metadata<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.metadata.read())
    }

    /// Replace metadata wholesale.
    pub fn set_metadata(&self, metadata: M) {
        *self.metadata.write() = metadata;
    }

    /// Modify metadata in place.
    ///
    /// Each call is atomic on its own; read-modify-write sequences spanning
    /// several calls are not.
    pub fn update_metadata<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut self.metadata.write())
    }

    /// Record a probe acknowledgment (pong) from the peer.
    pub fn acknowledge_probe(&self) {
        self.outstanding_probes.store(0, Ordering::SeqCst);
    }

    /// Probes sent since the last acknowledgment.
    pub fn outstanding_probes(&self) -> u32 {
        self.outstanding_probes.load(Ordering::SeqCst)
    }

    pub(crate) fn record_probe(&self) -> u32 {
        self.outstanding_probes.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl<M> std::fmt::Debug for Connection<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("state", &self.channel.state())
            .field("connected_at", &self.connected_at)
            .finish_non_exhaustive()
    }
}
