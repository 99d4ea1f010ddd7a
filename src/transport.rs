//! Bidirectional line transports.
//!
//! A [`Transport`] reads and writes whole protocol lines regardless of
//! whether the underlying connection is a byte stream or a WebSocket.

mod error;

pub use error::TransportError;

use std::collections::VecDeque;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::DuplexStream;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::error::ProtocolError;
use crate::line::{split_records, LineCodec};
use crate::util::MAX_LINE_LEN;

#[allow(clippy::large_enum_variant)]
pub enum Transport {
    Tcp {
        framed: Framed<TcpStream, LineCodec>,
    },
    WebSocket {
        stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        /// Records of the last frame not yet handed out.
        pending: VecDeque<String>,
    },
    /// An in-process pipe, used to drive sessions without a network.
    Memory {
        framed: Framed<DuplexStream, LineCodec>,
    },
}

impl Transport {
    pub fn tcp(stream: TcpStream) -> Self {
        if let Err(e) = Self::enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }
        Self::Tcp {
            framed: Framed::new(stream, LineCodec::new()),
        }
    }

    /// Connect a plain TCP transport to `addr` (`host:port`).
    pub async fn connect_tcp(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::tcp(stream))
    }

    fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
        use socket2::{SockRef, TcpKeepalive};

        let sock = SockRef::from(stream);
        let keepalive = TcpKeepalive::new()
            .with_time(Duration::from_secs(120))
            .with_interval(Duration::from_secs(30));

        sock.set_tcp_keepalive(&keepalive)
    }

    pub fn websocket(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        Self::WebSocket {
            stream,
            pending: VecDeque::new(),
        }
    }

    pub fn memory(stream: DuplexStream) -> Self {
        Self::Memory {
            framed: Framed::new(stream, LineCodec::new()),
        }
    }

    pub fn is_websocket(&self) -> bool {
        matches!(self, Self::WebSocket { .. })
    }

    /// Read the next complete line.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly.
    /// Cancel safe: a line is never lost if the returned future is dropped.
    pub async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        macro_rules! read_framed {
            ($framed:expr) => {
                match $framed.next().await {
                    Some(Ok(line)) => Ok(Some(line)),
                    Some(Err(e)) => Err(TransportError::from(e)),
                    None => Ok(None),
                }
            };
        }

        match self {
            Transport::Tcp { framed } => read_framed!(framed),
            Transport::Memory { framed } => read_framed!(framed),
            Transport::WebSocket { stream, pending } => loop {
                if let Some(line) = pending.pop_front() {
                    return Ok(Some(line));
                }
                match read_websocket_frame(stream).await? {
                    Some(frame) => {
                        for record in split_records(&frame) {
                            if record.len() > MAX_LINE_LEN {
                                return Err(ProtocolError::LineTooLong(record.len()).into());
                            }
                            pending.push_back(record.to_owned());
                        }
                    }
                    None => return Ok(None),
                }
            },
        }
    }

    /// Write one line; the terminator is added for stream transports.
    pub async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        match self {
            Transport::Tcp { framed } => framed.send(line.to_owned()).await?,
            Transport::Memory { framed } => framed.send(line.to_owned()).await?,
            Transport::WebSocket { stream, .. } => {
                let line = line.trim_end_matches(['\r', '\n']);
                stream.send(WsMessage::Text(line.to_owned())).await?
            }
        }
        Ok(())
    }

    /// Close the connection. Errors are logged and otherwise ignored.
    pub async fn close(&mut self) {
        let result = match self {
            Transport::Tcp { framed } => SinkExt::<String>::close(framed)
                .await
                .map_err(TransportError::from),
            Transport::Memory { framed } => SinkExt::<String>::close(framed)
                .await
                .map_err(TransportError::from),
            Transport::WebSocket { stream, .. } => {
                stream.close(None).await.map_err(TransportError::from)
            }
        };
        if let Err(e) = result {
            debug!("error while closing transport: {}", e);
        }
    }
}

async fn read_websocket_frame<S>(
    stream: &mut WebSocketStream<S>,
) -> Result<Option<String>, TransportError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(WsMessage::Text(text))) => return Ok(Some(text)),
            Some(Ok(WsMessage::Close(_))) | None => return Ok(None),
            Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => continue,
            Some(Ok(WsMessage::Binary(_))) => {
                warn!("ignoring binary WebSocket frame (chat is text-only)");
                continue;
            }
            Some(Ok(WsMessage::Frame(_))) => continue,
            Some(Err(tungstenite::Error::ConnectionClosed))
            | Some(Err(tungstenite::Error::AlreadyClosed)) => return Ok(None),
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_memory_round_trip() {
        let (client, mut server) = tokio::io::duplex(1024);
        let mut transport = Transport::memory(client);

        transport.write_line("JOIN #bar").await.unwrap();
        let mut buf = [0u8; 11];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"JOIN #bar\r\n");

        server.write_all(b"PING :tmi.twitch.tv\r\n").await.unwrap();
        assert_eq!(
            transport.read_line().await.unwrap().as_deref(),
            Some("PING :tmi.twitch.tv")
        );
    }

    #[tokio::test]
    async fn test_memory_clean_close() {
        let (client, server) = tokio::io::duplex(64);
        let mut transport = Transport::memory(client);
        drop(server);
        assert!(transport.read_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_invalid_utf8_is_error() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut transport = Transport::memory(client);
        server.write_all(b"\xff\xfe\r\n").await.unwrap();
        assert!(matches!(
            transport.read_line().await,
            Err(TransportError::Protocol(ProtocolError::Decode(_)))
        ));
    }
}
