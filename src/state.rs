//! Sans-IO session state machine.
//!
//! [`SessionMachine`] performs no I/O. It is told about connection
//! lifecycle changes and fed decoded messages, and answers with the lines
//! to send and the transitions that happened. The async driver in
//! [`crate::session`] owns the transport and the timers.
//!
//! ```
//! use tmi_proto::state::{HandshakeConfig, SessionAction, SessionMachine, SessionState};
//! use tmi_proto::Message;
//!
//! let mut machine = SessionMachine::new(HandshakeConfig::new("justinfan123", "secret"));
//! machine.connecting();
//! let handshake = machine.opened();
//! assert_eq!(handshake[1].to_string(), "PASS oauth:secret");
//! machine.handshake_sent();
//!
//! let welcome = Message::decode(":tmi.twitch.tv 001 justinfan123 :Welcome, GLHF!");
//! let actions = machine.feed(&welcome);
//! assert!(matches!(&actions[0], SessionAction::Authenticated(nick) if nick == "justinfan123"));
//! assert_eq!(machine.state(), SessionState::Ready);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use crate::command::{Command, Request};
use crate::message::{Message, Outgoing};

/// Capabilities requested during the handshake unless configured otherwise.
pub const DEFAULT_CAPABILITIES: [&str; 3] = [
    "twitch.tv/membership",
    "twitch.tv/tags",
    "twitch.tv/commands",
];

/// Lifecycle state of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Not connected. Initial state, and the state after a lost connection.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Connected; the handshake is being sent.
    Open,
    /// Handshake sent, waiting for the server to accept it.
    Authenticating,
    /// Accepted by the server.
    Ready,
    /// Closed by the caller. Terminal.
    Closed,
}

impl SessionState {
    /// Whether lines can be written in this state.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Open | Self::Authenticating | Self::Ready)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Authenticating => "authenticating",
            Self::Ready => "ready",
            Self::Closed => "closed",
        })
    }
}

/// Credentials and capabilities sent during the handshake.
#[derive(Clone)]
pub struct HandshakeConfig {
    /// Login name, sent lowercased with `NICK`.
    pub nickname: String,
    /// OAuth token, with or without its `oauth:` prefix.
    pub token: String,
    pub capabilities: Vec<String>,
}

impl HandshakeConfig {
    pub fn new(nickname: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            token: token.into(),
            capabilities: DEFAULT_CAPABILITIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl fmt::Debug for HandshakeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeConfig")
            .field("nickname", &self.nickname)
            .field("token", &"<redacted>")
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// What the driver has to do after feeding a message.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionAction {
    /// Write this line.
    Send(Outgoing),
    /// The server accepted the handshake; we are now `Ready` under this
    /// nickname.
    Authenticated(String),
    /// The server asked us to reconnect.
    Reconnect,
}

#[derive(Clone, Debug)]
pub struct SessionMachine {
    config: HandshakeConfig,
    state: SessionState,
    /// Nickname confirmed by the last welcome.
    nickname: Option<String>,
    /// Rooms to be in, without `#`.
    rooms: BTreeSet<String>,
}

impl SessionMachine {
    #[must_use]
    pub fn new(config: HandshakeConfig) -> Self {
        Self {
            config,
            state: SessionState::Disconnected,
            nickname: None,
            rooms: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Nickname the server confirmed, if we reached `Ready` at least once.
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// Rooms that will be joined (again) once `Ready`.
    pub fn rooms(&self) -> impl Iterator<Item = &str> {
        self.rooms.iter().map(String::as_str)
    }

    /// A connection attempt starts. Ignored once closed.
    pub fn connecting(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Connecting;
        }
    }

    /// The transport is up. Returns the handshake lines, in order.
    #[must_use]
    pub fn opened(&mut self) -> Vec<Outgoing> {
        self.state = SessionState::Open;
        vec![
            Request::CAP(self.config.capabilities.clone()).into(),
            Request::pass(&self.config.token).into(),
            Request::NICK(self.config.nickname.to_ascii_lowercase()).into(),
        ]
    }

    /// The handshake lines were written.
    pub fn handshake_sent(&mut self) {
        if self.state == SessionState::Open {
            self.state = SessionState::Authenticating;
        }
    }

    /// Feed one inbound message.
    #[must_use]
    pub fn feed(&mut self, msg: &Message) -> Vec<SessionAction> {
        if !self.state.is_connected() {
            return Vec::new();
        }

        match &msg.command {
            Command::AUTHENTICATED(nick) => {
                self.state = SessionState::Ready;
                self.nickname = Some(nick.clone());
                let mut actions = vec![SessionAction::Authenticated(nick.clone())];
                actions.extend(
                    self.rooms
                        .iter()
                        .map(|room| SessionAction::Send(Request::JOIN(room.clone()).into())),
                );
                actions
            }
            Command::PING => {
                let server = msg.trailing.as_deref().unwrap_or("tmi.twitch.tv");
                vec![SessionAction::Send(Request::PONG(server.to_owned()).into())]
            }
            Command::RECONNECT => vec![SessionAction::Reconnect],
            _ => Vec::new(),
        }
    }

    /// Route a caller request.
    ///
    /// JOIN and PART update the remembered room set and are only passed on
    /// once `Ready`; earlier joins are sent after authentication. Other
    /// requests pass whenever a connection is up. `None` means nothing is
    /// written now.
    #[must_use]
    pub fn request(&mut self, out: Outgoing) -> Option<Outgoing> {
        match &out.request {
            Request::JOIN(room) => {
                let added = self.rooms.insert(room.clone());
                (self.state == SessionState::Ready && added).then_some(out)
            }
            Request::PART(room) => {
                let removed = self.rooms.remove(room);
                (self.state == SessionState::Ready && removed).then_some(out)
            }
            _ => self.state.is_connected().then_some(out),
        }
    }

    /// The connection was lost or torn down.
    pub fn disconnected(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Disconnected;
        }
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }
}
