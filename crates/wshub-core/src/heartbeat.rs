//! Heartbeat supervision.
//!
//! Each armed connection gets a task that sends a ping on a fixed period,
//! regardless of traffic. Cleanup of dead sockets is driven by the
//! transport's own close/error events; the probes only make half-open
//! sockets visible to it. Eviction after a number of unanswered probes is
//! available through [`HeartbeatConfig::max_missed_probes`] and is off by
//! default.

use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::connection::{Connection, ConnectionId};

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;

/// Heartbeat settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Time between probes.
    pub interval: Duration,
    /// Close the channel once this many probes are outstanding.
    pub max_missed_probes: Option<u32>,
}

impl HeartbeatConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_missed_probes: None,
        }
    }

    pub fn with_max_missed_probes(mut self, max: u32) -> Self {
        self.max_missed_probes = Some(max);
        self
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(30_000))
    }
}

/// Owns one probe task per connection.
pub struct HeartbeatSupervisor {
    config: HeartbeatConfig,
    timers: DashMap<ConnectionId, JoinHandle<()>>,
}

impl HeartbeatSupervisor {
    pub fn new(config: HeartbeatConfig) -> Self {
        Self {
            config,
            timers: DashMap::new(),
        }
    }

    pub fn config(&self) -> &HeartbeatConfig {
        &self.config
    }

    /// Start probing a connection. Re-arming replaces the previous timer.
    ///
    /// Returns `false` when called outside a tokio runtime.
    pub fn arm<M>(&self, conn: &Arc<Connection<M>>) -> bool
    where
        M: Send + Sync + 'static,
    {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(
                    connection_id = %conn.id(),
                    "No tokio runtime; heartbeat not armed"
                );
                return false;
            }
        };

        let task = handle.spawn(probe_loop(Arc::downgrade(conn), self.config));
        if let Some(previous) = self.timers.insert(conn.id().to_string(), task) {
            previous.abort();
        }
        debug!(connection_id = %conn.id(), "Heartbeat armed");
        true
    }

    /// Cancel the timer for a connection.
    pub fn disarm(&self, id: &str) -> bool {
        match self.timers.remove(id) {
            Some((_, task)) => {
                task.abort();
                debug!(connection_id = %id, "Heartbeat disarmed");
                true
            }
            None => false,
        }
    }

    /// Cancel every timer. Returns how many were cancelled.
    pub fn disarm_all(&self) -> usize {
        let ids: Vec<ConnectionId> = self.timers.iter().map(|e| e.key().clone()).collect();
        ids.iter().filter(|id| self.disarm(id)).count()
    }

    /// Whether a live probe task exists for the connection.
    pub fn is_armed(&self, id: &str) -> bool {
        self.timers
            .get(id)
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    pub fn armed_count(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for HeartbeatSupervisor {
    fn drop(&mut self) {
        for entry in self.timers.iter() {
            entry.value().abort();
        }
    }
}

async fn probe_loop<M>(conn: Weak<Connection<M>>, config: HeartbeatConfig)
where
    M: Send + Sync + 'static,
{
    let mut ticker = interval_at(Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(conn) = conn.upgrade() else {
            break;
        };

        if let Some(max) = config.max_missed_probes {
            let outstanding = conn.outstanding_probes();
            if outstanding >= max {
                warn!(
                    connection_id = %conn.id(),
                    outstanding,
                    "Peer stopped answering probes, closing channel"
                );
                if let Err(e) = conn.channel().close() {
                    warn!(
                        connection_id = %conn.id(),
                        "Failed to close unresponsive channel: {}", e
                    );
                }
                break;
            }
        }

        conn.record_probe();
        if let Err(e) = conn.channel().ping(Vec::new()) {
            debug!(connection_id = %conn.id(), "Probe not sent: {}", e);
        }
    }
}
