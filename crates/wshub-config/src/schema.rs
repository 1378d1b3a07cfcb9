//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub websocket: WebSocketConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// WebSocket transport options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSocketConfig {
    /// Route that accepts upgrades.
    #[serde(default = "default_path")]
    pub path: String,

    /// Largest accepted inbound message, in bytes.
    #[serde(default = "default_max_payload")]
    pub max_payload: usize,

    /// Send periodic liveness probes.
    #[serde(default = "default_true")]
    pub heartbeat: bool,

    /// Milliseconds between probes.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: u64,

    /// Close a connection after this many unanswered probes. Unset means
    /// never.
    #[serde(default)]
    pub max_missed_probes: Option<u32>,

    /// Origins allowed to upgrade. Empty accepts every origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_path() -> String {
    "/ws".to_string()
}

fn default_max_payload() -> usize {
    1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_heartbeat_interval() -> u64 {
    30_000
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            max_payload: default_max_payload(),
            heartbeat: default_true(),
            heartbeat_interval: default_heartbeat_interval(),
            max_missed_probes: None,
            allowed_origins: Vec::new(),
        }
    }
}

impl WebSocketConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily-rotated log files. `~` is expanded.
    #[serde(default = "default_log_dir")]
    pub dir: String,

    /// Write log files in addition to the console.
    #[serde(default = "default_true")]
    pub file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "~/.wshub/logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
            file: default_true(),
        }
    }
}
