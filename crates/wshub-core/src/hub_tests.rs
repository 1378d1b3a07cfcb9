use super::*;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use wshub_protocols::HandlerError;

use crate::test_support::RecordingChannel;

/// Records lifecycle calls; optionally fails selected callbacks.
#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<String>>,
    fail_connect: bool,
    fail_message: bool,
    fail_disconnect: bool,
    manager: Option<Arc<ConnectionManager<Metadata>>>,
}

impl RecordingHandler {
    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().push(event);
    }
}

#[async_trait]
impl ConnectionHandler<Metadata> for RecordingHandler {
    async fn on_connect(&self, _conn: &Arc<Connection<Metadata>>) -> Result<(), HandlerError> {
        self.push("connect".to_string());
        if self.fail_connect {
            return Err(HandlerError::failed("connect refused"));
        }
        Ok(())
    }

    async fn on_message(
        &self,
        conn: &Arc<Connection<Metadata>>,
        envelope: Envelope,
    ) -> Result<(), HandlerError> {
        self.push(format!("message:{}", envelope.kind));
        if self.fail_message {
            return Err(HandlerError::failed("bad message"));
        }
        if let Some(manager) = &self.manager {
            manager.send(conn.id(), &Envelope::new("echo", envelope.data));
        }
        Ok(())
    }

    async fn on_error(
        &self,
        _conn: &Arc<Connection<Metadata>>,
        error: &ConnectionError,
    ) -> Result<(), HandlerError> {
        let kind = match error {
            ConnectionError::Decode(_) => "decode",
            ConnectionError::Transport(_) => "transport",
            ConnectionError::Handler(_) => "handler",
        };
        self.push(format!("error:{}", kind));
        Ok(())
    }

    async fn on_disconnect(&self, conn: &Arc<Connection<Metadata>>) -> Result<(), HandlerError> {
        let registered = self
            .manager
            .as_ref()
            .map(|m| m.contains(conn.id()))
            .unwrap_or(false);
        self.push(format!("disconnect:registered={}", registered));
        if self.fail_disconnect {
            return Err(HandlerError::failed("cleanup failed"));
        }
        Ok(())
    }
}

fn hub_with(handler: RecordingHandler) -> (Hub, Arc<RecordingHandler>) {
    let manager = handler
        .manager
        .clone()
        .unwrap_or_else(|| Arc::new(ConnectionManager::new()));
    let handler = Arc::new(handler);
    let hub = Hub::new(manager, handler.clone() as Arc<dyn ConnectionHandler<Metadata>>);
    (hub, handler)
}

#[tokio::test]
async fn test_connect_registers_then_calls_on_connect() {
    let (hub, handler) = hub_with(RecordingHandler::default());

    let conn = hub.connect(RecordingChannel::open(), Metadata::new()).await;

    assert!(hub.manager().contains(conn.id()));
    assert_eq!(handler.events(), vec!["connect"]);
}

#[tokio::test]
async fn test_on_connect_error_is_swallowed() {
    let (hub, _handler) = hub_with(RecordingHandler {
        fail_connect: true,
        ..Default::default()
    });

    let conn = hub.connect(RecordingChannel::open(), Metadata::new()).await;
    assert!(hub.manager().contains(conn.id()));
}

#[tokio::test]
async fn test_message_dispatched_and_handler_can_reply() {
    let manager = Arc::new(ConnectionManager::new());
    let (hub, handler) = hub_with(RecordingHandler {
        manager: Some(manager.clone()),
        ..Default::default()
    });
    let channel = RecordingChannel::open();
    let conn = hub.connect(channel.clone(), Metadata::new()).await;

    hub.message(&conn, r#"{"type":"chat","data":{"text":"hi"}}"#).await;

    assert_eq!(handler.events(), vec!["connect", "message:chat"]);
    let frames = channel.frames_json();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "echo");
    assert_eq!(frames[0]["data"], json!({"text": "hi"}));
}

#[tokio::test]
async fn test_malformed_frame_goes_to_on_error_only() {
    let (hub, handler) = hub_with(RecordingHandler::default());
    let channel = RecordingChannel::open();
    let conn = hub.connect(channel.clone(), Metadata::new()).await;

    hub.message(&conn, "{not json").await;
    hub.message(&conn, r#"{"data":1}"#).await;

    assert_eq!(handler.events(), vec!["connect", "error:decode", "error:decode"]);
    assert!(hub.manager().contains(conn.id()));
    assert_eq!(channel.closes(), 0);
}

#[tokio::test]
async fn test_on_message_error_forwarded_to_on_error() {
    let (hub, handler) = hub_with(RecordingHandler {
        fail_message: true,
        ..Default::default()
    });
    let conn = hub.connect(RecordingChannel::open(), Metadata::new()).await;

    hub.message(&conn, r#"{"type":"x","data":1}"#).await;

    assert_eq!(
        handler.events(),
        vec!["connect", "message:x", "error:handler"]
    );
    assert!(hub.manager().contains(conn.id()));
}

#[tokio::test]
async fn test_transport_error_reported() {
    let (hub, handler) = hub_with(RecordingHandler::default());
    let conn = hub.connect(RecordingChannel::open(), Metadata::new()).await;

    hub.error(&conn, ConnectionError::transport("reset")).await;

    assert_eq!(handler.events(), vec!["connect", "error:transport"]);
}

#[tokio::test]
async fn test_disconnect_removes_before_on_disconnect() {
    let manager = Arc::new(ConnectionManager::new());
    let (hub, handler) = hub_with(RecordingHandler {
        manager: Some(manager.clone()),
        ..Default::default()
    });
    let channel = RecordingChannel::open();
    let conn = hub.connect(channel.clone(), Metadata::new()).await;

    assert!(hub.disconnect(&conn).await);
    assert!(!hub.disconnect(&conn).await);

    assert_eq!(
        handler.events(),
        vec![
            "connect",
            "disconnect:registered=false",
            "disconnect:registered=false"
        ]
    );
    assert_eq!(manager.size(), 0);
    assert_eq!(channel.closes(), 0);
}

#[tokio::test]
async fn test_on_disconnect_error_is_swallowed() {
    let (hub, _handler) = hub_with(RecordingHandler {
        fail_disconnect: true,
        ..Default::default()
    });
    let conn = hub.connect(RecordingChannel::open(), Metadata::new()).await;

    assert!(hub.disconnect(&conn).await);
    assert!(hub.manager().is_empty());
}

#[tokio::test]
async fn test_pong_acknowledges_probe() {
    let (hub, _handler) = hub_with(RecordingHandler::default());
    let conn = hub.connect(RecordingChannel::open(), Metadata::new()).await;

    conn.record_probe();
    conn.record_probe();
    hub.pong(&conn);

    assert_eq!(conn.outstanding_probes(), 0);
}

#[tokio::test]
async fn test_shutdown_closes_and_empties() {
    let (hub, _handler) = hub_with(RecordingHandler::default());
    let channels: Vec<_> = (0..3).map(|_| RecordingChannel::open()).collect();
    for channel in &channels {
        hub.connect(channel.clone(), Metadata::new()).await;
    }

    assert_eq!(hub.shutdown(), 3);
    assert!(hub.manager().is_empty());
    assert!(channels.iter().all(|c| c.closes() == 1));
}

#[tokio::test]
async fn test_noop_handler() {
    let manager: Arc<ConnectionManager> = Arc::new(ConnectionManager::new());
    let hub = Hub::new(manager, Arc::new(crate::NoopHandler));
    let conn = hub.connect(RecordingChannel::open(), Metadata::new()).await;

    hub.message(&conn, "garbage").await;
    assert!(hub.disconnect(&conn).await);
}
