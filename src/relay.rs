//! Default application handler: a chat-style relay.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use wshub_core::{
    Connection, ConnectionError, ConnectionHandler, ConnectionManager, Envelope, HandlerError,
};

/// Greets new connections with their id and relays every inbound message
/// to all other connections.
pub(crate) struct RelayHandler {
    manager: Arc<ConnectionManager>,
}

impl RelayHandler {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl ConnectionHandler for RelayHandler {
    async fn on_connect(&self, conn: &Arc<Connection>) -> Result<(), HandlerError> {
        let welcome = Envelope::new("connected", json!({ "id": conn.id() }));
        if !self.manager.send(conn.id(), &welcome) {
            return Err(HandlerError::failed("welcome message not delivered"));
        }
        Ok(())
    }

    async fn on_message(
        &self,
        conn: &Arc<Connection>,
        envelope: Envelope,
    ) -> Result<(), HandlerError> {
        let relayed = Envelope::new(
            envelope.kind,
            json!({ "from": conn.id(), "data": envelope.data }),
        );
        let report = self.manager.broadcast_counted(&relayed, &[conn.id()]);
        debug!(
            connection_id = %conn.id(),
            delivered = report.delivered,
            failed = report.failed.len(),
            "Relayed message"
        );
        Ok(())
    }

    async fn on_error(
        &self,
        conn: &Arc<Connection>,
        error: &ConnectionError,
    ) -> Result<(), HandlerError> {
        if error.is_decode() {
            let reply = Envelope::new("error", json!({ "message": error.to_string() }));
            self.manager.send(conn.id(), &reply);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde_json::Value;
    use wshub_core::{Channel, ChannelError, ChannelState, Hub, Metadata};

    #[derive(Clone, Default)]
    struct Outbox(Arc<Mutex<Vec<String>>>);

    impl Outbox {
        fn frames(&self) -> Vec<Value> {
            self.0
                .lock()
                .iter()
                .map(|f| serde_json::from_str(f).unwrap())
                .collect()
        }
    }

    impl Channel for Outbox {
        fn state(&self) -> ChannelState {
            ChannelState::Open
        }

        fn send_text(&self, text: String) -> Result<(), ChannelError> {
            self.0.lock().push(text);
            Ok(())
        }

        fn ping(&self, _payload: Vec<u8>) -> Result<(), ChannelError> {
            Ok(())
        }

        fn close(&self) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    fn hub() -> Hub {
        let manager = Arc::new(ConnectionManager::new());
        Hub::new(manager.clone(), Arc::new(RelayHandler::new(manager)))
    }

    #[tokio::test]
    async fn test_welcome_carries_id() {
        let hub = hub();
        let outbox = Outbox::default();
        let conn = hub.connect(outbox.clone(), Metadata::new()).await;

        let frames = outbox.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], "connected");
        assert_eq!(frames[0]["data"]["id"], conn.id());
    }

    #[tokio::test]
    async fn test_relay_skips_sender() {
        let hub = hub();
        let (a, b) = (Outbox::default(), Outbox::default());
        let sender = hub.connect(a.clone(), Metadata::new()).await;
        hub.connect(b.clone(), Metadata::new()).await;

        hub.message(&sender, r#"{"type":"chat","data":"hello"}"#).await;

        assert_eq!(a.frames().len(), 1);
        let relayed = &b.frames()[1];
        assert_eq!(relayed["type"], "chat");
        assert_eq!(relayed["data"]["from"], sender.id());
        assert_eq!(relayed["data"]["data"], "hello");
    }

    #[tokio::test]
    async fn test_decode_error_reported_to_sender() {
        let hub = hub();
        let outbox = Outbox::default();
        let conn = hub.connect(outbox.clone(), Metadata::new()).await;

        hub.message(&conn, "{broken").await;

        let frames = outbox.frames();
        assert_eq!(frames[1]["type"], "error");
        assert!(hub.manager().contains(conn.id()));
    }
}
