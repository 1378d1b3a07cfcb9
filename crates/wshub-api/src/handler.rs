//! WebSocket upgrade handler and per-socket read loop.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::{header, Extensions, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::stream::SplitStream;
use futures::StreamExt;
use serde_json::{Map, Value};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use wshub_core::{now_millis, ChannelState, ConnectionError, Hub, Metadata, ProtocolError};

use crate::channel::AxumChannel;
use crate::state::WsState;
use crate::verify::ClientInfo;

/// How long to wait for the peer to finish a close handshake it started.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// WebSocket upgrade handler.
///
/// Runs the verifier first; a rejected request gets `401` and no
/// connection is created.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<WsState>,
    headers: HeaderMap,
    extensions: Extensions,
) -> Response {
    let remote_addr = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = ClientInfo::from_headers(headers, remote_addr);

    if !state.verifier.verify(&client) {
        warn!(
            origin = client.origin.as_deref().unwrap_or("-"),
            "WebSocket upgrade rejected"
        );
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let metadata = initial_metadata(&client);
    let max_payload = state.config.max_payload;
    let hub = state.hub.clone();

    ws.max_message_size(max_payload)
        .max_frame_size(max_payload)
        .on_upgrade(move |socket| handle_socket(socket, hub, metadata))
}

/// Metadata recorded for every new connection.
fn initial_metadata(client: &ClientInfo) -> Metadata {
    let mut metadata = Metadata::new()
        .with("connected_at", now_millis())
        .with("secure", client.secure);

    if let Some(addr) = client.remote_addr {
        metadata.insert("remote_addr", addr.to_string());
    }
    if let Some(origin) = &client.origin {
        metadata.insert("origin", origin.clone());
    }
    if let Some(agent) = client
        .headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
    {
        metadata.insert("user_agent", agent);
    }

    let headers: Map<String, Value> = client
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), Value::from(v)))
        })
        .collect();
    metadata.insert("headers", Value::Object(headers));

    metadata
}

/// Drive one upgraded socket until it closes.
async fn handle_socket(socket: WebSocket, hub: Hub, metadata: Metadata) {
    let (sink, mut stream) = socket.split();
    let (channel, writer) = AxumChannel::spawn(sink);
    let channel_state = channel.shared_state();

    let conn = hub.connect(channel, metadata).await;

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                hub.message(&conn, text.as_str()).await;
            }
            Ok(Message::Binary(data)) => {
                debug!(
                    connection_id = %conn.id(),
                    len = data.len(),
                    "Binary frame received"
                );
                let error =
                    ProtocolError::InvalidShape("binary frames are not supported".to_string());
                hub.error(&conn, ConnectionError::Decode(error)).await;
            }
            Ok(Message::Pong(_)) => {
                hub.pong(&conn);
            }
            Ok(Message::Ping(_)) => {
                // axum answers pings itself
                debug!(connection_id = %conn.id(), "Ping received");
            }
            Ok(Message::Close(frame)) => {
                info!(
                    connection_id = %conn.id(),
                    code = ?frame.as_ref().map(|f| f.code),
                    "Close frame received"
                );
                finish_close_handshake(&mut stream).await;
                break;
            }
            Err(e) => {
                hub.error(&conn, ConnectionError::transport(e.to_string()))
                    .await;
                break;
            }
        }
    }

    channel_state.set(ChannelState::Closed);
    hub.disconnect(&conn).await;
    writer.abort();
}

/// Keep reading after a peer `Close` so the queued close reply is flushed,
/// up to [`CLOSE_GRACE`].
async fn finish_close_handshake(stream: &mut SplitStream<WebSocket>) {
    let drain = async { while stream.next().await.is_some() {} };
    if timeout(CLOSE_GRACE, drain).await.is_err() {
        debug!("Peer did not finish the close handshake");
    }
}
