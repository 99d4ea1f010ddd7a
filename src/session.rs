//! Async session driver.
//!
//! A [`Session`] is a cheap, cloneable handle. [`Session::start`] spawns a
//! driver task that owns the transport: it connects, sends the handshake,
//! decodes inbound lines, answers pings, emits events and reconnects with
//! exponential backoff after transport errors. Sends from any handle are
//! queued on an unbounded channel and written by the driver in order.
//!
//! ```no_run
//! use tmi_proto::{EventKind, Event, Session, SessionConfig};
//!
//! # async fn run() -> Result<(), tmi_proto::SessionError> {
//! let session = Session::new(SessionConfig::new("justinfan123", "oauth:abc"));
//! session.on(EventKind::Message, |event| {
//!     if let Event::Message(msg) = event {
//!         println!("{:?}: {:?}", msg.sender(), msg.text());
//!     }
//! });
//! session.start()?;
//! session.join("#forsen")?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::command::Request;
use crate::config::{ReconnectPolicy, SessionConfig};
use crate::connector::{Connector, TcpConnector, WebSocketConnector};
use crate::error::SessionError;
use crate::events::{Event, EventEmitter, EventKind, ListenerId};
use crate::message::{Message, Outgoing};
use crate::state::{SessionAction, SessionMachine, SessionState};
use crate::transport::{Transport, TransportError};
use crate::websocket::{is_websocket_url, WebSocketConfig};

/// Tag carrying the id of the message being replied to.
pub const REPLY_PARENT_TAG: &str = "reply-parent-msg-id";

#[derive(Clone)]
pub struct Session {
    inner: Arc<Shared>,
}

struct Shared {
    config: SessionConfig,
    events: EventEmitter,
    state: watch::Sender<SessionState>,
    requests: mpsc::UnboundedSender<Outgoing>,
    /// Taken by the first `start`.
    pending: Mutex<Option<Pending>>,
    cancel: CancellationToken,
}

struct Pending {
    requests: mpsc::UnboundedReceiver<Outgoing>,
    connector: Box<dyn Connector>,
}

impl Session {
    /// A session connecting to `config.endpoint`: WebSocket for `ws://` and
    /// `wss://` urls, plain TCP for `host:port`.
    pub fn new(config: SessionConfig) -> Self {
        let connector: Box<dyn Connector> = if is_websocket_url(&config.endpoint) {
            let ws = WebSocketConfig::new(config.endpoint.clone())
                .with_connect_timeout(config.connect_timeout());
            Box::new(WebSocketConnector::new(ws))
        } else {
            Box::new(TcpConnector::new(config.endpoint.clone()))
        };
        Self::build(config, connector)
    }

    /// A session that opens its transports through `connector`.
    pub fn with_connector(config: SessionConfig, connector: impl Connector) -> Self {
        Self::build(config, Box::new(connector))
    }

    fn build(config: SessionConfig, connector: Box<dyn Connector>) -> Self {
        let (requests, receiver) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            inner: Arc::new(Shared {
                config,
                events: EventEmitter::new(),
                state,
                requests,
                pending: Mutex::new(Some(Pending {
                    requests: receiver,
                    connector,
                })),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Create and start a session in one go.
    pub fn connect(config: SessionConfig) -> Result<Self, SessionError> {
        let session = Self::new(config);
        session.start()?;
        Ok(session)
    }

    /// Spawn the driver task. Must be called from within a tokio runtime.
    ///
    /// Register listeners before starting to observe the first `open`.
    pub fn start(&self) -> Result<JoinHandle<()>, SessionError> {
        if self.inner.cancel.is_cancelled() {
            return Err(SessionError::Closed);
        }
        let pending = self
            .inner
            .pending
            .lock()
            .take()
            .ok_or(SessionError::AlreadyStarted)?;
        let shared = self.inner.clone();
        Ok(tokio::spawn(drive(shared, pending)))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.events.on(kind, listener)
    }

    pub fn once<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.events.once(kind, listener)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.events.off(id)
    }

    pub fn clear_listeners(&self) {
        self.inner.events.clear()
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Subscribe to state changes.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Queue a line for the driver to write.
    pub fn send(&self, out: impl Into<Outgoing>) -> Result<(), SessionError> {
        if self.inner.cancel.is_cancelled() {
            return Err(SessionError::Closed);
        }
        self.inner
            .requests
            .send(out.into())
            .map_err(|_| SessionError::Closed)
    }

    /// Join a room. Remembered and re-joined after every reconnect.
    pub fn join(&self, room: &str) -> Result<(), SessionError> {
        self.send(Request::join(room))
    }

    pub fn leave(&self, room: &str) -> Result<(), SessionError> {
        self.send(Request::part(room))
    }

    pub fn send_chat_message(&self, channel: &str, text: &str) -> Result<(), SessionError> {
        self.send(Request::privmsg(channel, text))
    }

    /// Send `text` as a threaded reply to the message with id `parent_id`.
    pub fn reply(&self, channel: &str, text: &str, parent_id: &str) -> Result<(), SessionError> {
        let out = Outgoing::new(Request::privmsg(channel, text)).with_tag(REPLY_PARENT_TAG, parent_id);
        self.send(out)
    }

    /// Close the session for good. Pending reconnects are abandoned.
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Shared {
    fn set_state(&self, state: SessionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            info!(from = %previous, to = %state, "session state changed");
        }
    }
}

/// How one connection ended.
enum Outcome {
    /// `close()` was called.
    Cancelled,
    /// The peer closed the connection cleanly.
    Closed,
    /// The server sent RECONNECT.
    Reconnect,
    Failed(TransportError),
}

struct Backoff {
    policy: ReconnectPolicy,
    delay: Duration,
    attempts: u32,
}

impl Backoff {
    fn new(policy: ReconnectPolicy) -> Self {
        Self {
            delay: policy.initial_delay(),
            policy,
            attempts: 0,
        }
    }

    /// Delay before the next attempt, or `None` once attempts are used up.
    fn next_delay(&mut self) -> Option<Duration> {
        if let Some(max) = self.policy.max_attempts {
            if self.attempts >= max {
                return None;
            }
        }
        self.attempts += 1;
        let delay = self.delay;
        self.delay = self.policy.next_delay(delay);
        let jitter = rand::thread_rng().gen_range(0..=delay.as_millis() as u64 / 4);
        Some(delay + Duration::from_millis(jitter))
    }

    fn reset(&mut self) {
        self.delay = self.policy.initial_delay();
        self.attempts = 0;
    }
}

/// Sleep for `delay` unless cancelled first. Returns `false` on cancel.
async fn sleep_or_cancel(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

async fn drive(shared: Arc<Shared>, pending: Pending) {
    let Pending {
        mut requests,
        connector,
    } = pending;
    let mut machine = SessionMachine::new(shared.config.handshake());
    let mut backoff = Backoff::new(shared.config.reconnect.clone());

    loop {
        machine.connecting();
        shared.set_state(machine.state());

        let connected = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            result = connector.connect() => result,
        };

        let outcome = match connected {
            Ok(mut transport) => {
                let outcome = run_connection(
                    &shared,
                    &mut machine,
                    &mut transport,
                    &mut requests,
                    &mut backoff,
                )
                .await;
                if !matches!(outcome, Outcome::Failed(_) | Outcome::Closed) {
                    transport.close().await;
                }
                outcome
            }
            Err(e) => Outcome::Failed(e),
        };

        machine.disconnected();
        shared.set_state(machine.state());
        shared.events.emit(&Event::Close);

        match outcome {
            Outcome::Cancelled => break,
            Outcome::Closed => {
                info!("connection closed by peer");
                return;
            }
            Outcome::Reconnect => {
                info!("server requested reconnect");
                continue;
            }
            Outcome::Failed(e) => match backoff.next_delay() {
                Some(delay) => {
                    let delay_ms = delay.as_millis() as u64;
                    warn!(error = %e, delay_ms, "connection lost, reconnecting");
                    if !sleep_or_cancel(&shared.cancel, delay).await {
                        break;
                    }
                }
                None => {
                    error!(error = %e, "connection lost, giving up after too many attempts");
                    return;
                }
            },
        }
    }

    machine.close();
    shared.set_state(machine.state());
    debug!("session driver stopped");
}

/// Drive one established connection until it ends.
async fn run_connection(
    shared: &Shared,
    machine: &mut SessionMachine,
    transport: &mut Transport,
    requests: &mut mpsc::UnboundedReceiver<Outgoing>,
    backoff: &mut Backoff,
) -> Outcome {
    let handshake = machine.opened();
    shared.set_state(machine.state());
    shared.events.emit(&Event::Open);

    for line in handshake {
        if let Err(e) = transport.write_line(&line.to_string()).await {
            return Outcome::Failed(e);
        }
    }
    machine.handshake_sent();
    shared.set_state(machine.state());

    loop {
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => return Outcome::Cancelled,
            request = requests.recv() => {
                let Some(out) = request else {
                    return Outcome::Cancelled;
                };
                if let Some(out) = machine.request(out) {
                    if let Err(e) = transport.write_line(&out.to_string()).await {
                        return Outcome::Failed(e);
                    }
                }
            }
            line = transport.read_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => return Outcome::Closed,
                    Err(e) => return Outcome::Failed(e),
                };

                let msg = Message::decode(&line);
                let mut reconnect = false;
                for action in machine.feed(&msg) {
                    match action {
                        SessionAction::Send(out) => {
                            if let Err(e) = transport.write_line(&out.to_string()).await {
                                return Outcome::Failed(e);
                            }
                        }
                        SessionAction::Authenticated(nick) => {
                            backoff.reset();
                            shared.set_state(machine.state());
                            info!(nickname = %nick, "authenticated");
                            shared.events.emit(&Event::Auth);
                        }
                        SessionAction::Reconnect => reconnect = true,
                    }
                }
                shared.events.emit(&Event::Message(msg));
                if reconnect {
                    return Outcome::Reconnect;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_attempt_cap() {
        let mut backoff = Backoff::new(ReconnectPolicy {
            initial_delay_ms: 100,
            max_delay_ms: 1_000,
            backoff_factor: 2.0,
            max_attempts: Some(2),
        });
        let first = backoff.next_delay().unwrap();
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(125));
        let second = backoff.next_delay().unwrap();
        assert!(second >= Duration::from_millis(200) && second <= Duration::from_millis(250));
        assert!(backoff.next_delay().is_none());

        backoff.reset();
        assert!(backoff.next_delay().is_some());
    }

    #[test]
    fn test_send_after_close() {
        let session = Session::new(SessionConfig::new("me", "tok"));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.join("bar").is_ok());
        session.close();
        assert!(session.is_closed());
        assert_eq!(session.join("bar"), Err(SessionError::Closed));
    }

    #[tokio::test]
    async fn test_start_twice() {
        let session = Session::with_connector(SessionConfig::new("me", "tok"), || async {
            Err::<Transport, _>(TransportError::Timeout)
        });
        let handle = session.start().unwrap();
        assert_eq!(session.start().unwrap_err(), SessionError::AlreadyStarted);
        session.close();
        handle.await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
    }
}
