//! In-memory channel used by the unit tests.

use std::sync::Arc;

use parking_lot::Mutex;

use wshub_protocols::{Channel, ChannelError, ChannelState};

#[derive(Default)]
struct Inner {
    state: Option<ChannelState>,
    frames: Vec<String>,
    pings: usize,
    closes: usize,
    fail_send: bool,
    fail_close: bool,
}

/// Channel that records every call. Clones share the same log, so a test
/// can keep one handle while the registry owns the other.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingChannel {
    pub fn open() -> Self {
        Self::with_state(ChannelState::Open)
    }

    pub fn closed() -> Self {
        Self::with_state(ChannelState::Closed)
    }

    pub fn with_state(state: ChannelState) -> Self {
        let channel = Self::default();
        channel.inner.lock().state = Some(state);
        channel
    }

    pub fn failing_send() -> Self {
        let channel = Self::open();
        channel.inner.lock().fail_send = true;
        channel
    }

    pub fn failing_close() -> Self {
        let channel = Self::open();
        channel.inner.lock().fail_close = true;
        channel
    }

    pub fn set_state(&self, state: ChannelState) {
        self.inner.lock().state = Some(state);
    }

    pub fn frames(&self) -> Vec<String> {
        self.inner.lock().frames.clone()
    }

    pub fn frames_json(&self) -> Vec<serde_json::Value> {
        self.frames()
            .iter()
            .map(|f| serde_json::from_str(f).unwrap())
            .collect()
    }

    pub fn pings(&self) -> usize {
        self.inner.lock().pings
    }

    pub fn closes(&self) -> usize {
        self.inner.lock().closes
    }
}

impl Channel for RecordingChannel {
    fn state(&self) -> ChannelState {
        self.inner.lock().state.unwrap_or(ChannelState::Open)
    }

    fn send_text(&self, frame: String) -> Result<(), ChannelError> {
        let mut inner = self.inner.lock();
        if inner.fail_send {
            return Err(ChannelError::SendFailed("simulated write failure".to_string()));
        }
        inner.frames.push(frame);
        Ok(())
    }

    fn ping(&self, _payload: Vec<u8>) -> Result<(), ChannelError> {
        self.inner.lock().pings += 1;
        Ok(())
    }

    fn close(&self) -> Result<(), ChannelError> {
        let mut inner = self.inner.lock();
        inner.closes += 1;
        if inner.fail_close {
            return Err(ChannelError::CloseFailed("simulated close failure".to_string()));
        }
        inner.state = Some(ChannelState::Closing);
        Ok(())
    }
}
