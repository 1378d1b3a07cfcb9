//! # wshub API
//!
//! Production transport adapter: accepts WebSocket upgrades on an axum
//! router and feeds connections and frames into a [`Hub`].
//!
//! ```text
//! HTTP upgrade ─▶ VerifyClient ─▶ handshake ─▶ Hub::connect
//!                      │ reject
//!                      ▼
//!                     401
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use wshub_api::{build_manager, WsServer};
//! use wshub_config::Config;
//! use wshub_core::{Hub, NoopHandler};
//!
//! let config = Config::default();
//! let manager = Arc::new(build_manager(&config.websocket));
//! let hub = Hub::new(manager, Arc::new(NoopHandler));
//! WsServer::new(config.server, config.websocket, hub).run().await?;
//! ```

pub mod channel;
pub mod error;
pub mod handler;
pub mod server;
pub mod state;
pub mod verify;

pub use channel::AxumChannel;
pub use error::ApiError;
pub use handler::ws_handler;
pub use server::{build_manager, heartbeat_config, WsServer};
pub use state::WsState;
pub use verify::{AcceptAll, ClientInfo, OriginAllowList, VerifyClient};
