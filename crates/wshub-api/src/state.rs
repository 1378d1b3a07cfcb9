//! State shared by the upgrade handler.

use std::sync::Arc;

use wshub_config::WebSocketConfig;
use wshub_core::Hub;

use crate::verify::{AcceptAll, OriginAllowList, VerifyClient};

/// Router state for [`ws_handler`](crate::ws_handler).
#[derive(Clone)]
pub struct WsState {
    pub hub: Hub,
    pub verifier: Arc<dyn VerifyClient>,
    pub config: Arc<WebSocketConfig>,
}

impl WsState {
    /// State with a verifier derived from `config.allowed_origins`.
    pub fn new(hub: Hub, config: WebSocketConfig) -> Self {
        let verifier: Arc<dyn VerifyClient> = if config.allowed_origins.is_empty() {
            Arc::new(AcceptAll)
        } else {
            Arc::new(OriginAllowList::new(&config.allowed_origins))
        };

        Self {
            hub,
            verifier,
            config: Arc::new(config),
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn VerifyClient>) -> Self {
        self.verifier = verifier;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::{header, HeaderMap, HeaderValue};
    use wshub_core::{ConnectionManager, NoopHandler};

    use crate::verify::ClientInfo;

    fn hub() -> Hub {
        Hub::new(Arc::new(ConnectionManager::new()), Arc::new(NoopHandler))
    }

    #[test]
    fn test_empty_allow_list_accepts_all() {
        let state = WsState::new(hub(), WebSocketConfig::default());
        assert!(state.verifier.verify(&ClientInfo::default()));
    }

    #[test]
    fn test_allowed_origins_become_allow_list() {
        let config = WebSocketConfig {
            allowed_origins: vec!["https://app.example".to_string()],
            ..Default::default()
        };
        let state = WsState::new(hub(), config);

        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, HeaderValue::from_static("https://other.example"));
        assert!(!state.verifier.verify(&ClientInfo::from_headers(headers, None)));
    }

    #[test]
    fn test_with_verifier_overrides() {
        let state = WsState::new(hub(), WebSocketConfig::default())
            .with_verifier(Arc::new(|_: &ClientInfo| false));
        assert!(!state.verifier.verify(&ClientInfo::default()));
    }
}
