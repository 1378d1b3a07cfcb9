//! WebSocket server.
//!
//! Binds a listener, mounts [`ws_handler`] on the configured path and
//! drains the hub when the shutdown signal fires.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use wshub_config::{ServerConfig, WebSocketConfig};
use wshub_core::{ConnectionManager, HeartbeatConfig, Hub};

use crate::error::ApiError;
use crate::handler::ws_handler;
use crate::state::WsState;
use crate::verify::VerifyClient;

/// Heartbeat settings for `config`, or `None` when probes are disabled.
pub fn heartbeat_config(config: &WebSocketConfig) -> Option<HeartbeatConfig> {
    if !config.heartbeat {
        return None;
    }

    let heartbeat = HeartbeatConfig::new(config.heartbeat_interval());
    Some(match config.max_missed_probes {
        Some(max) => heartbeat.with_max_missed_probes(max),
        None => heartbeat,
    })
}

/// Registry configured from `config`.
pub fn build_manager(config: &WebSocketConfig) -> ConnectionManager {
    match heartbeat_config(config) {
        Some(heartbeat) => ConnectionManager::with_heartbeat(heartbeat),
        None => ConnectionManager::new(),
    }
}

/// The WebSocket server.
pub struct WsServer {
    config: ServerConfig,
    state: WsState,
}

impl WsServer {
    pub fn new(config: ServerConfig, websocket: WebSocketConfig, hub: Hub) -> Self {
        Self {
            config,
            state: WsState::new(hub, websocket),
        }
    }

    /// Replace the upgrade verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn VerifyClient>) -> Self {
        self.state = self.state.with_verifier(verifier);
        self
    }

    pub fn hub(&self) -> &Hub {
        &self.state.hub
    }

    /// Get the server address.
    pub fn addr(&self) -> String {
        self.config.addr()
    }

    /// Build the router.
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.state.config.path, get(ws_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve until Ctrl+C.
    pub async fn run(&self) -> Result<(), ApiError> {
        self.run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Bind the configured address and serve until `signal` resolves.
    pub async fn run_until<F>(&self, signal: F) -> Result<(), ApiError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr_str = self.addr();
        let addr: SocketAddr = addr_str.parse().map_err(|e: std::net::AddrParseError| {
            ApiError::InvalidAddress {
                addr: addr_str.clone(),
                reason: e.to_string(),
            }
        })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiError::Bind {
                addr: addr_str,
                source,
            })?;

        self.serve(listener, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves, then
    /// close every registered connection.
    pub async fn serve<F>(&self, listener: TcpListener, signal: F) -> Result<(), ApiError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr()?;
        info!("WebSocket server listening on ws://{}{}", local, self.state.config.path);

        let hub = self.state.hub.clone();
        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                let closed = hub.shutdown();
                info!("Shutting down, closed {} connections", closed);
            })
            .await?;

        Ok(())
    }
}
