//! # tmi-proto
//!
//! A Rust library for talking to Twitch chat (TMI) and turning its messages
//! into something renderable.
//!
//! ## Features
//!
//! - Line decoding with typed IRCv3 tags (badges, emotes, colors, flags)
//! - Command classification and outbound command serialization
//! - A sans-IO session state machine plus a tokio driver with automatic
//!   reconnection, room memory and event listeners
//! - WebSocket, TCP and in-memory transports sharing one line codec
//! - Segmentation of chat text into text, emote and mention segments
//! - An adapter for the 7TV third-party emote catalog

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Decoding lines
//!
//! ```rust
//! use tmi_proto::{Command, Message};
//!
//! let raw = "@badges=subscriber/12;color=#1E90FF;display-name=Alice \
//!            :alice!alice@alice.tmi.twitch.tv PRIVMSG #bar :hello chat";
//! let message = Message::decode(raw);
//!
//! assert_eq!(message.command, Command::PRIVMSG("#bar".into()));
//! assert_eq!(message.sender(), Some("Alice"));
//! let tags = message.tags.as_ref().unwrap();
//! assert!(tags.badges().unwrap().has("subscriber"));
//! assert_eq!(tags.color().unwrap().to_string(), "#1E90FF");
//! ```
//!
//! ### Segmenting chat text
//!
//! ```rust
//! use tmi_proto::{Message, Segment, Segmenter};
//!
//! let message = Message::decode("@emotes=25:0-4 :a!a@a.tmi.twitch.tv PRIVMSG #bar :Kappa hi");
//! let segments = Segmenter::for_message(&message).unwrap().segments();
//! assert!(matches!(&segments[0], Segment::Emote { display_name, .. } if display_name == "Kappa"));
//! assert_eq!(segments[1], Segment::text(" hi"));
//! ```
//!
//! ### Running a session
//!
//! ```rust,no_run
//! use tmi_proto::{Event, EventKind, Session, SessionConfig};
//!
//! # async fn run() -> Result<(), tmi_proto::SessionError> {
//! let session = Session::new(SessionConfig::new("justinfan123", "oauth:abc"));
//! session.on(EventKind::Auth, |_| println!("authenticated"));
//! session.start()?;
//! session.join("bar")?;
//! session.send_chat_message("bar", "hello")?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod message;
pub mod segment;
pub mod source;
pub mod state;
pub mod util;

pub use self::catalog::{CatalogEntry, EmoteCatalog};
pub use self::command::{Command, Request};
pub use self::config::{ReconnectPolicy, SessionConfig};
pub use self::error::{CatalogError, ConfigError, ProtocolError, SessionError, TagError};
pub use self::message::{
    Badge, Badges, Color, EmoteRange, EmoteRanges, Message, Outgoing, Tag, TagName, TagValue, Tags,
};
pub use self::segment::{find_mentions, MentionMatch, PeopleLookup, PersonSettings, Segment, Segmenter};
pub use self::source::Source;
pub use self::state::{SessionAction, SessionMachine, SessionState};

#[cfg(feature = "tokio")]
pub mod connector;
#[cfg(feature = "tokio")]
pub mod events;
#[cfg(feature = "tokio")]
pub mod line;
#[cfg(feature = "tokio")]
pub mod session;
#[cfg(feature = "tokio")]
pub mod transport;
#[cfg(feature = "tokio")]
pub mod websocket;

#[cfg(feature = "tokio")]
pub use self::connector::{Connector, TcpConnector, WebSocketConnector};
#[cfg(feature = "tokio")]
pub use self::events::{Event, EventKind, ListenerId};
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
#[cfg(feature = "tokio")]
pub use self::session::Session;
#[cfg(feature = "tokio")]
pub use self::transport::{Transport, TransportError};
#[cfg(feature = "tokio")]
pub use self::websocket::WebSocketConfig;
