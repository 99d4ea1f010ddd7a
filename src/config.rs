//! Session configuration.
//!
//! Configurations are plain serde structs, so they can be built in code or
//! loaded from JSON:
//!
//! ```
//! use tmi_proto::config::SessionConfig;
//!
//! let config = SessionConfig::from_json(r#"{
//!     "username": "justinfan123",
//!     "token": "abc",
//!     "reconnect": { "max_attempts": 5 }
//! }"#).unwrap();
//! assert_eq!(config.endpoint, "wss://irc-ws.chat.twitch.tv:443");
//! assert_eq!(config.reconnect.max_attempts, Some(5));
//! assert_eq!(config.reconnect.initial_delay_ms, 1000);
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_CATALOG_URL;
use crate::error::ConfigError;
use crate::state::{HandshakeConfig, DEFAULT_CAPABILITIES};

/// The public chat WebSocket endpoint.
pub const DEFAULT_ENDPOINT: &str = "wss://irc-ws.chat.twitch.tv:443";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_capabilities() -> Vec<String> {
    DEFAULT_CAPABILITIES.iter().map(|c| c.to_string()).collect()
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Login name.
    pub username: String,
    /// OAuth token, with or without `oauth:`.
    pub token: String,
    /// `wss://` / `ws://` url, or `host:port` for plain TCP.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
    /// Base url of the emote catalog service; the user id is appended.
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl SessionConfig {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            endpoint: default_endpoint(),
            capabilities: default_capabilities(),
            reconnect: ReconnectPolicy::default(),
            catalog_url: default_catalog_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::Missing("username"));
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::Missing("token"));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn handshake(&self) -> HandshakeConfig {
        HandshakeConfig {
            nickname: self.username.clone(),
            token: self.token.clone(),
            capabilities: self.capabilities.clone(),
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("capabilities", &self.capabilities)
            .field("reconnect", &self.reconnect)
            .field("catalog_url", &self.catalog_url)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}

/// Exponential backoff between reconnect attempts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
    /// Consecutive failed attempts before giving up. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            backoff_factor: 2.0,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// The delay following `delay`, capped at [`max_delay`](Self::max_delay).
    pub fn next_delay(&self, delay: Duration) -> Duration {
        let next = delay.as_millis() as f64 * self.backoff_factor.max(1.0);
        Duration::from_millis((next as u64).min(self.max_delay_ms))
    }
}
