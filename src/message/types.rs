//! Owned message types.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::command::{middle_param, Command, Request};
use crate::source::Source;

use super::nom_parser::ParsedLine;
use super::tags::{escape_tag_value, TagName, Tags};

/// One decoded inbound line.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Decoded tag block, if the line had one.
    pub tags: Option<Tags>,
    /// Origin of the line, if the line had one.
    pub source: Option<Source>,
    /// Classified command.
    pub command: Command,
    /// Free-text parameter after the first `:`.
    pub trailing: Option<String>,
}

impl Message {
    /// Decode one raw line (terminator optional). Never fails.
    pub fn decode(line: &str) -> Self {
        let parsed = ParsedLine::parse(line);
        Self {
            tags: parsed.tags.map(Tags::parse),
            source: parsed.source.map(Source::parse),
            command: Command::classify(parsed.command),
            trailing: parsed.trailing.map(str::to_owned),
        }
    }

    /// Chat text of a `PRIVMSG`.
    pub fn text(&self) -> Option<&str> {
        match self.command {
            Command::PRIVMSG(_) => self.trailing.as_deref(),
            _ => None,
        }
    }

    /// The channel this message belongs to, without `#`.
    pub fn channel(&self) -> Option<&str> {
        self.command.channel()
    }

    /// Display name of the sender, falling back to the source actor.
    pub fn sender(&self) -> Option<&str> {
        self.tags
            .as_ref()
            .and_then(Tags::display_name)
            .or_else(|| self.source.as_ref()?.actor.as_deref())
    }

    /// Server-assigned id of this message (`id` tag).
    pub fn id(&self) -> Option<&str> {
        self.tags.as_ref()?.id()
    }

    /// Whether the message carries `name`.
    pub fn has_tag(&self, name: &TagName) -> bool {
        self.tags.as_ref().is_some_and(|t| t.has(name))
    }
}

impl FromStr for Message {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::decode(s))
    }
}

/// An outbound line: optional client tags plus a [`Request`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outgoing {
    pub tags: Vec<(String, String)>,
    pub request: Request,
}

impl Outgoing {
    pub fn new(request: Request) -> Self {
        Self {
            tags: Vec::new(),
            request,
        }
    }

    /// Attach a tag. The value is escaped on serialization.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }
}

impl From<Request> for Outgoing {
    fn from(request: Request) -> Self {
        Self::new(request)
    }
}

impl fmt::Display for Outgoing {
    /// `[@k=v;k=v ]VERB params`, without a line terminator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.tags.is_empty() {
            f.write_str("@")?;
            for (i, (key, value)) in self.tags.iter().enumerate() {
                if i > 0 {
                    f.write_str(";")?;
                }
                let key = middle_param(key);
                write!(f, "{}=", key.replace(['=', ';'], ""))?;
                escape_tag_value(f, value)?;
            }
            f.write_str(" ")?;
        }
        write!(f, "{}", self.request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_privmsg() {
        let msg: Message = ":foo!foo@foo.tmi.twitch.tv PRIVMSG #bar :hi there"
            .parse()
            .unwrap();
        assert_eq!(msg.command, Command::PRIVMSG("#bar".to_string()));
        assert_eq!(msg.text(), Some("hi there"));
        assert_eq!(msg.channel(), Some("bar"));
        assert_eq!(msg.sender(), Some("foo"));
        assert!(msg.tags.is_none());
    }

    #[test]
    fn test_sender_prefers_display_name() {
        let msg = Message::decode("@display-name=Foo;id=abc :foo!foo@foo PRIVMSG #bar :x");
        assert_eq!(msg.sender(), Some("Foo"));
        assert_eq!(msg.id(), Some("abc"));
        assert!(msg.has_tag(&TagName::DisplayName));
    }

    #[test]
    fn test_decode_garbage_is_unexpected() {
        for line in ["", "   ", "@", ":", "@x :y", "::::"] {
            let msg = Message::decode(line);
            assert_eq!(msg.command, Command::UNEXPECTED, "{:?}", line);
        }
    }

    #[test]
    fn test_text_only_for_privmsg() {
        let msg = Message::decode(":tmi.twitch.tv NOTICE #bar :slow mode");
        assert_eq!(msg.text(), None);
        assert_eq!(msg.trailing.as_deref(), Some("slow mode"));
    }

    #[test]
    fn test_outgoing_without_tags() {
        let out = Outgoing::new(Request::privmsg("bar", "hello"));
        assert_eq!(out.to_string(), "PRIVMSG #bar :hello");
    }

    #[test]
    fn test_outgoing_with_tags() {
        let out = Outgoing::new(Request::privmsg("bar", "hello"))
            .with_tag("reply-parent-msg-id", "abc-123")
            .with_tag("client-nonce", "a b");
        assert_eq!(
            out.to_string(),
            "@reply-parent-msg-id=abc-123;client-nonce=a\\sb PRIVMSG #bar :hello"
        );
    }

    #[test]
    fn test_outgoing_is_a_single_record() {
        let out = Outgoing::new(Request::privmsg("bar", "hi\r\nJOIN #evil"))
            .with_tag("reply-parent-msg-id", "x\r\nPART #bar")
            .with_tag("bad key=;\n", "1");
        let line = out.to_string();
        assert!(!line.contains(['\r', '\n']));
        assert_eq!(
            line,
            "@reply-parent-msg-id=x\\r\\nPART\\s#bar;badkey=1 PRIVMSG #bar :hi  JOIN #evil"
        );
    }
}
