//! `Channel` implementation over an axum WebSocket.
//!
//! Writes go into a bounded queue drained by a dedicated writer task, so
//! every `Channel` call returns without awaiting the socket. A peer that
//! stops reading fills its queue and further writes fail.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::debug;

use wshub_protocols::{Channel, ChannelError, ChannelState};

/// Ready state shared between the channel, its writer task and the reader
/// loop.
#[derive(Debug, Clone)]
pub struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new(state: ChannelState) -> Self {
        Self(Arc::new(AtomicU8::new(encode(state))))
    }

    pub fn get(&self) -> ChannelState {
        decode(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, state: ChannelState) {
        self.0.store(encode(state), Ordering::SeqCst);
    }

    /// Move to `next` only from `from`.
    fn transition(&self, from: ChannelState, next: ChannelState) -> bool {
        self.0
            .compare_exchange(
                encode(from),
                encode(next),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

fn encode(state: ChannelState) -> u8 {
    match state {
        ChannelState::Connecting => 0,
        ChannelState::Open => 1,
        ChannelState::Closing => 2,
        ChannelState::Closed => 3,
    }
}

fn decode(value: u8) -> ChannelState {
    match value {
        0 => ChannelState::Connecting,
        1 => ChannelState::Open,
        2 => ChannelState::Closing,
        _ => ChannelState::Closed,
    }
}

/// Frames buffered per socket before writes are refused.
pub const OUTBOUND_CAPACITY: usize = 256;

/// Handle on the outbound half of an axum WebSocket.
pub struct AxumChannel {
    tx: mpsc::Sender<Message>,
    state: SharedState,
}

impl AxumChannel {
    /// Take ownership of the sink half and spawn its writer task.
    pub fn spawn(sink: SplitSink<WebSocket, Message>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let state = SharedState::new(ChannelState::Open);
        let writer = tokio::spawn(write_loop(sink, rx, state.clone()));
        (Self { tx, state }, writer)
    }

    pub fn shared_state(&self) -> SharedState {
        self.state.clone()
    }

    fn enqueue(&self, message: Message) -> Result<(), String> {
        self.tx.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => "outbound queue full".to_string(),
            TrySendError::Closed(_) => "writer stopped".to_string(),
        })
    }
}

impl Channel for AxumChannel {
    fn state(&self) -> ChannelState {
        self.state.get()
    }

    fn send_text(&self, frame: String) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Closed);
        }
        self.enqueue(Message::Text(frame.into()))
            .map_err(ChannelError::SendFailed)
    }

    fn ping(&self, payload: Vec<u8>) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Closed);
        }
        self.enqueue(Message::Ping(Bytes::from(payload)))
            .map_err(ChannelError::PingFailed)
    }

    fn close(&self) -> Result<(), ChannelError> {
        if !self.state.transition(ChannelState::Open, ChannelState::Closing) {
            // Already closing or closed.
            return Ok(());
        }

        let frame = CloseFrame {
            code: close_code::NORMAL,
            reason: Utf8Bytes::from_static(""),
        };
        match self.tx.try_send(Message::Close(Some(frame))) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                // Leave the channel open so the close can be retried.
                self.state.set(ChannelState::Open);
                Err(ChannelError::CloseFailed("outbound queue full".to_string()))
            }
            Err(TrySendError::Closed(_)) => {
                self.state.set(ChannelState::Closed);
                Err(ChannelError::CloseFailed("writer stopped".to_string()))
            }
        }
    }
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Message>,
    state: SharedState,
) {
    while let Some(message) = rx.recv().await {
        let is_close = matches!(message, Message::Close(_));
        if let Err(e) = sink.send(message).await {
            debug!("WebSocket write failed: {}", e);
            break;
        }
        if is_close {
            break;
        }
    }

    state.set(ChannelState::Closed);
}
