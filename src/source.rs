//! Message source (prefix) decoding.

use std::fmt;

/// The origin of a message: `actor!host` or just `host`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Source {
    /// Login of the user that sent the message, if any.
    pub actor: Option<String>,
    /// Host part (`foo@foo.tmi.twitch.tv` or `tmi.twitch.tv`).
    pub host: String,
}

impl Source {
    /// Decode a prefix token without its leading `:`.
    ///
    /// Splits on the first `!`. Any input is valid.
    ///
    /// ```
    /// use tmi_proto::Source;
    ///
    /// let src = Source::parse("alice!alice.tmi.twitch.tv");
    /// assert_eq!(src.actor.as_deref(), Some("alice"));
    /// assert_eq!(src.host, "alice.tmi.twitch.tv");
    /// ```
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('!') {
            Some((actor, host)) => Self {
                actor: Some(actor.to_owned()),
                host: host.to_owned(),
            },
            None => Self {
                actor: None,
                host: raw.to_owned(),
            },
        }
    }

    /// The login portion of the host (`foo` in `foo@foo.tmi.twitch.tv`).
    pub fn user(&self) -> Option<&str> {
        self.host.split_once('@').map(|(user, _)| user)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.actor {
            Some(actor) => write!(f, "{}!{}", actor, self.host),
            None => f.write_str(&self.host),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_and_host() {
        let src = Source::parse("alice!alice.tmi.twitch.tv");
        assert_eq!(src.actor.as_deref(), Some("alice"));
        assert_eq!(src.host, "alice.tmi.twitch.tv");
    }

    #[test]
    fn test_host_only() {
        let src = Source::parse("tmi.twitch.tv");
        assert_eq!(src.actor, None);
        assert_eq!(src.host, "tmi.twitch.tv");
    }

    #[test]
    fn test_splits_on_first_bang() {
        let src = Source::parse("a!b!c");
        assert_eq!(src.actor.as_deref(), Some("a"));
        assert_eq!(src.host, "b!c");
    }

    #[test]
    fn test_empty() {
        let src = Source::parse("");
        assert_eq!(src.actor, None);
        assert_eq!(src.host, "");
    }

    #[test]
    fn test_user_and_display() {
        let src = Source::parse("foo!foo@foo.tmi.twitch.tv");
        assert_eq!(src.user(), Some("foo"));
        assert_eq!(src.to_string(), "foo!foo@foo.tmi.twitch.tv");
    }
}
