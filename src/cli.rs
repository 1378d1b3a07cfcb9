//! CLI definitions for wshub.

use std::path::PathBuf;

use clap::Parser;

use wshub_config::Config;

/// wshub CLI.
#[derive(Parser, Debug)]
#[command(name = "wshub")]
#[command(about = "WebSocket connection hub")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "wshub.toml", env = "WSHUB_CONFIG")]
    pub config: PathBuf,

    /// Listen host
    #[arg(long, env = "WSHUB_HOST")]
    pub host: Option<String>,

    /// Listen port
    #[arg(short, long, env = "WSHUB_PORT")]
    pub port: Option<u16>,

    /// WebSocket route
    #[arg(long)]
    pub path: Option<String>,

    /// Disable heartbeat probes
    #[arg(long)]
    pub no_heartbeat: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(path) = &self.path {
            config.websocket.path = path.clone();
        }
        if self.no_heartbeat {
            config.websocket.heartbeat = false;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}
