//! Application lifecycle handler.

use std::sync::Arc;

use async_trait::async_trait;

use wshub_protocols::{ConnectionError, Envelope, HandlerError, Metadata};

use crate::connection::Connection;

/// Callbacks the [`Hub`](crate::Hub) invokes at each lifecycle point.
///
/// Handlers that need to reply or broadcast hold their own
/// `Arc<ConnectionManager>`. Errors returned here are logged by the hub;
/// none of them end the connection.
#[async_trait]
pub trait ConnectionHandler<M = Metadata>: Send + Sync
where
    M: Send + Sync + 'static,
{
    /// After the connection is registered.
    async fn on_connect(&self, _conn: &Arc<Connection<M>>) -> Result<(), HandlerError> {
        Ok(())
    }

    /// For each inbound frame that decoded into an envelope, in arrival order.
    async fn on_message(
        &self,
        _conn: &Arc<Connection<M>>,
        _envelope: Envelope,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Transport errors, decode failures and `on_message` errors.
    async fn on_error(
        &self,
        _conn: &Arc<Connection<M>>,
        _error: &ConnectionError,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// After the connection has been removed from the registry.
    async fn on_disconnect(&self, _conn: &Arc<Connection<M>>) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Handler that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

#[async_trait]
impl<M> ConnectionHandler<M> for NoopHandler where M: Send + Sync + 'static {}
