//! Strategies for opening a fresh transport.
//!
//! A session calls its [`Connector`] once per connection attempt, so every
//! reconnect gets a new transport.

use std::future::Future;

use futures_util::future::BoxFuture;

use crate::transport::{Transport, TransportError};
use crate::websocket::{self, WebSocketConfig};

pub trait Connector: Send + Sync + 'static {
    /// Open a new connection.
    fn connect(&self) -> BoxFuture<'_, Result<Transport, TransportError>>;
}

/// Connects over WebSocket. The default for chat sessions.
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector {
    config: WebSocketConfig,
}

impl WebSocketConnector {
    pub fn new(config: WebSocketConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }
}

impl Connector for WebSocketConnector {
    fn connect(&self) -> BoxFuture<'_, Result<Transport, TransportError>> {
        Box::pin(websocket::connect(&self.config))
    }
}

/// Connects a plain line-oriented TCP stream to `host:port`.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl Connector for TcpConnector {
    fn connect(&self) -> BoxFuture<'_, Result<Transport, TransportError>> {
        Box::pin(Transport::connect_tcp(&self.addr))
    }
}

impl<F, Fut> Connector for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Transport, TransportError>> + Send + 'static,
{
    fn connect(&self) -> BoxFuture<'_, Result<Transport, TransportError>> {
        Box::pin(self())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_closure_connector() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let connector = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let (client, _server) = tokio::io::duplex(64);
            async move { Ok::<_, TransportError>(Transport::memory(client)) }
        };

        let transport = connector.connect().await.unwrap();
        assert!(!transport.is_websocket());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tcp_connector_refused() {
        // Port 1 on localhost is essentially never listening.
        let connector = TcpConnector::new("127.0.0.1:1");
        assert!(matches!(
            connector.connect().await,
            Err(TransportError::Io(_))
        ));
    }
}
