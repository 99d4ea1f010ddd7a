//! Transport error types.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::error::ProtocolError;

/// Errors that can occur while connecting, reading or writing a transport.
///
/// Every variant is treated the same by a session: the connection is
/// considered lost and a reconnect is scheduled.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The byte stream could not be framed into lines.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The WebSocket layer failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] Box<tungstenite::Error>),

    /// Connecting took longer than the configured timeout.
    #[error("connect timed out")]
    Timeout,

    /// The endpoint could not be used to connect.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<tungstenite::Error> for TransportError {
    fn from(err: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}
