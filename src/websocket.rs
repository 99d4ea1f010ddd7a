//! WebSocket client connection setup.

use std::fmt;
use std::time::Duration;

use tokio_tungstenite::connect_async;
use tracing::debug;

use crate::transport::{Transport, TransportError};

pub use crate::config::DEFAULT_ENDPOINT;

/// Time allowed for the TCP, TLS and WebSocket handshakes together.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSocketConfig {
    pub url: String,

    pub connect_timeout: Duration,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl WebSocketConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Whether the url uses the `wss` scheme.
    pub fn is_secure(&self) -> bool {
        self.url.starts_with("wss://")
    }
}

impl fmt::Display for WebSocketConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Whether `endpoint` names a WebSocket url rather than a `host:port` pair.
pub fn is_websocket_url(endpoint: &str) -> bool {
    endpoint.starts_with("ws://") || endpoint.starts_with("wss://")
}

/// Open a WebSocket transport.
pub async fn connect(config: &WebSocketConfig) -> Result<Transport, TransportError> {
    if !is_websocket_url(&config.url) {
        return Err(TransportError::InvalidEndpoint(config.url.clone()));
    }

    let handshake = connect_async(config.url.as_str());
    let (stream, response) = tokio::time::timeout(config.connect_timeout, handshake)
        .await
        .map_err(|_| TransportError::Timeout)??;

    debug!(url = %config.url, status = %response.status(), "websocket connected");
    Ok(Transport::websocket(stream))
}
