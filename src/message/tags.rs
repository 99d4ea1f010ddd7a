//! Tag block decoding and IRCv3 tag value escaping.
//!
//! A tag block is the `badges=broadcaster/1;color=#FF0000;...` part of a
//! line between the leading `@` and the first space. Each pair is decoded
//! into a typed [`TagValue`] according to its key. Unknown keys are kept as
//! [`TagName::Unrecognized`] and never cause an error.

use std::fmt::{self, Result as FmtResult, Write};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::TagError;

use super::badges::Badges;
use super::emotes::EmoteRanges;

/// Escape a tag value for serialization.
///
/// Escapes special characters using the IRCv3 message-tags escape table.
pub fn escape_tag_value(f: &mut dyn Write, value: &str) -> FmtResult {
    for c in value.chars() {
        match c {
            ';' => f.write_str("\\:")?,
            ' ' => f.write_str("\\s")?,
            '\\' => f.write_str("\\\\")?,
            '\r' => f.write_str("\\r")?,
            '\n' => f.write_str("\\n")?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

/// Unescape a tag value from wire format.
///
/// Reverses the escaping applied by [`escape_tag_value`].
pub(crate) fn unescape_tag_value(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut iter = value.chars();
    while let Some(c) = iter.next() {
        let r = if c == '\\' {
            match iter.next() {
                Some(':') => ';',
                Some('s') => ' ',
                Some('\\') => '\\',
                Some('r') => '\r',
                Some('n') => '\n',
                Some(c) => c,
                None => break,
            }
        } else {
            c
        };
        unescaped.push(r);
    }
    unescaped
}

/// An RGB color as carried by the `color` tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Default mention color.
    pub const WHITE: Color = Color {
        r: 0xff,
        g: 0xff,
        b: 0xff,
    };

    /// Parse `#RRGGBB`. Anything else yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let hex = raw.strip_prefix('#')?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Known tag keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TagName {
    Badges,
    BadgeInfo,
    Emotes,
    EmoteSets,
    Color,
    Mod,
    Subscriber,
    EmoteOnly,
    Slow,
    SubsOnly,
    Vip,
    Turbo,
    FirstMsg,
    ReturningChatter,
    DisplayName,
    Login,
    UserId,
    Id,
    RoomId,
    TargetMsgId,
    ReplyParentMsgId,
    TmiSentTs,
    /// Any key not listed above, kept verbatim.
    Unrecognized(String),
}

impl TagName {
    pub fn from_key(key: &str) -> Self {
        match key {
            "badges" => Self::Badges,
            "badge-info" => Self::BadgeInfo,
            "emotes" => Self::Emotes,
            "emote-sets" => Self::EmoteSets,
            "color" => Self::Color,
            "mod" => Self::Mod,
            "subscriber" => Self::Subscriber,
            "emote-only" => Self::EmoteOnly,
            "slow" => Self::Slow,
            "subs-only" => Self::SubsOnly,
            "vip" => Self::Vip,
            "turbo" => Self::Turbo,
            "first-msg" => Self::FirstMsg,
            "returning-chatter" => Self::ReturningChatter,
            "display-name" => Self::DisplayName,
            "login" => Self::Login,
            "user-id" => Self::UserId,
            "id" => Self::Id,
            "room-id" => Self::RoomId,
            "target-msg-id" => Self::TargetMsgId,
            "reply-parent-msg-id" => Self::ReplyParentMsgId,
            "tmi-sent-ts" => Self::TmiSentTs,
            other => Self::Unrecognized(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Badges => "badges",
            Self::BadgeInfo => "badge-info",
            Self::Emotes => "emotes",
            Self::EmoteSets => "emote-sets",
            Self::Color => "color",
            Self::Mod => "mod",
            Self::Subscriber => "subscriber",
            Self::EmoteOnly => "emote-only",
            Self::Slow => "slow",
            Self::SubsOnly => "subs-only",
            Self::Vip => "vip",
            Self::Turbo => "turbo",
            Self::FirstMsg => "first-msg",
            Self::ReturningChatter => "returning-chatter",
            Self::DisplayName => "display-name",
            Self::Login => "login",
            Self::UserId => "user-id",
            Self::Id => "id",
            Self::RoomId => "room-id",
            Self::TargetMsgId => "target-msg-id",
            Self::ReplyParentMsgId => "reply-parent-msg-id",
            Self::TmiSentTs => "tmi-sent-ts",
            Self::Unrecognized(key) => key,
        }
    }
}

/// Typed value of a tag.
#[derive(Clone, Debug, PartialEq)]
pub enum TagValue {
    Flag(bool),
    Text(String),
    /// A `#RRGGBB` color. Any other `color` value decodes as `Text`.
    Color(Color),
    List(Vec<String>),
    Badges(Badges),
    Emotes(EmoteRanges),
    Timestamp(DateTime<Utc>),
    /// Value of a tag whose key is not known, unescaped.
    Unrecognized(String),
}

impl TagValue {
    fn decode(name: &TagName, raw: &str) -> Self {
        match name {
            TagName::Badges | TagName::BadgeInfo => Self::Badges(Badges::parse(raw)),
            TagName::Emotes => Self::Emotes(EmoteRanges::parse(raw)),
            TagName::EmoteSets => Self::List(raw.split(',').map(str::to_owned).collect()),
            TagName::Color => match Color::parse(raw) {
                Some(color) => Self::Color(color),
                None => Self::Text(unescape_tag_value(raw)),
            },
            TagName::Mod
            | TagName::Subscriber
            | TagName::EmoteOnly
            | TagName::Slow
            | TagName::SubsOnly
            | TagName::Vip
            | TagName::Turbo
            | TagName::FirstMsg
            | TagName::ReturningChatter => {
                Self::Flag(raw.parse::<i64>().map(|n| n > 0).unwrap_or(false))
            }
            TagName::TmiSentTs => {
                let millis = raw.parse::<i64>().ok();
                match millis.and_then(DateTime::<Utc>::from_timestamp_millis) {
                    Some(ts) => Self::Timestamp(ts),
                    None => Self::Text(unescape_tag_value(raw)),
                }
            }
            TagName::DisplayName
            | TagName::Login
            | TagName::UserId
            | TagName::Id
            | TagName::RoomId
            | TagName::TargetMsgId
            | TagName::ReplyParentMsgId => Self::Text(unescape_tag_value(raw)),
            TagName::Unrecognized(_) => Self::Unrecognized(unescape_tag_value(raw)),
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Unrecognized(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    /// Wire encoding of the value, escaped where it is free text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => f.write_str(if *b { "1" } else { "0" }),
            Self::Text(s) | Self::Unrecognized(s) => escape_tag_value(f, s),
            Self::Color(c) => write!(f, "{}", c),
            Self::List(items) => f.write_str(&items.join(",")),
            Self::Badges(b) => write!(f, "{}", b),
            Self::Emotes(e) => write!(f, "{}", e),
            Self::Timestamp(ts) => write!(f, "{}", ts.timestamp_millis()),
        }
    }
}

/// A decoded `key=value` pair. `value` is `None` for an empty value.
#[derive(Clone, Debug, PartialEq)]
pub struct Tag {
    pub name: TagName,
    pub value: Option<TagValue>,
}

impl Tag {
    /// Decode a tag from its key and raw (still escaped) value.
    pub fn new(key: &str, raw_value: &str) -> Self {
        let name = TagName::from_key(key);
        let value = if raw_value.is_empty() {
            None
        } else {
            Some(TagValue::decode(&name, raw_value))
        };
        Self { name, value }
    }

    /// Decode one `key=value` pair, splitting on the first `=`.
    pub fn parse(pair: &str) -> Result<Self, TagError> {
        match pair.split_once('=') {
            Some((key, value)) => Ok(Self::new(key, value)),
            None => Err(TagError::Malformed(pair.to_owned())),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=", self.name.as_str())?;
        match &self.value {
            Some(value) => write!(f, "{}", value),
            None => Ok(()),
        }
    }
}

/// All tags of a line, in wire order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tags(Vec<Tag>);

impl Tags {
    /// Decode a tag block (without the leading `@`).
    ///
    /// Malformed pairs are logged and skipped; the block as a whole always
    /// decodes.
    pub fn parse(raw: &str) -> Self {
        let mut tags = Vec::new();
        for pair in raw.split(';').filter(|p| !p.is_empty()) {
            match Tag::parse(pair) {
                Ok(tag) => tags.push(tag),
                Err(e) => debug!(error = %e, "skipping tag pair"),
            }
        }
        Self(tags)
    }

    pub fn has(&self, name: &TagName) -> bool {
        self.0.iter().any(|t| &t.name == name)
    }

    /// Value of the first tag with this name. `None` if absent or empty.
    pub fn get(&self, name: &TagName) -> Option<&TagValue> {
        self.0
            .iter()
            .find(|t| &t.name == name)
            .and_then(|t| t.value.as_ref())
    }

    /// Look up a tag by its wire key, known or not.
    pub fn get_key(&self, key: &str) -> Option<&TagValue> {
        self.get(&TagName::from_key(key))
    }

    pub fn badges(&self) -> Option<&Badges> {
        match self.get(&TagName::Badges)? {
            TagValue::Badges(b) => Some(b),
            _ => None,
        }
    }

    pub fn badge_info(&self) -> Option<&Badges> {
        match self.get(&TagName::BadgeInfo)? {
            TagValue::Badges(b) => Some(b),
            _ => None,
        }
    }

    pub fn emotes(&self) -> Option<&EmoteRanges> {
        match self.get(&TagName::Emotes)? {
            TagValue::Emotes(e) => Some(e),
            _ => None,
        }
    }

    pub fn emote_sets(&self) -> Option<&[String]> {
        match self.get(&TagName::EmoteSets)? {
            TagValue::List(sets) => Some(sets),
            _ => None,
        }
    }

    pub fn color(&self) -> Option<Color> {
        match self.get(&TagName::Color)? {
            TagValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn flag(&self, name: &TagName) -> Option<bool> {
        self.get(name)?.as_flag()
    }

    pub fn text(&self, name: &TagName) -> Option<&str> {
        self.get(name)?.as_text()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.text(&TagName::DisplayName)
    }

    pub fn id(&self) -> Option<&str> {
        self.text(&TagName::Id)
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        match self.get(&TagName::TmiSentTs)? {
            TagValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &TagName> {
        self.0.iter().map(|t| &t.name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char(';')?;
            }
            write!(f, "{}", tag)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// IRCv3 specifies these escape sequences:
    /// - `\:` → `;` (semicolon)
    /// - `\s` → ` ` (space)
    /// - `\\` → `\` (backslash)
    /// - `\r` → CR (carriage return)
    /// - `\n` → LF (line feed)
    #[test]
    fn test_unescape_combined() {
        let input = "a\\:b\\sc\\\\d\\re\\nf";
        let expected = "a;b c\\d\re\nf";
        assert_eq!(unescape_tag_value(input), expected);
    }

    #[test]
    fn test_unescape_trailing_backslash() {
        assert_eq!(unescape_tag_value("test\\"), "test");
    }

    #[test]
    fn test_unescape_unknown_escape() {
        assert_eq!(unescape_tag_value("a\\xb"), "axb");
    }

    #[test]
    fn test_escape_roundtrip() {
        for original in ["simple", "with space", "with;semicolon", "complex; \\ \n \r all"] {
            let mut escaped = String::new();
            escape_tag_value(&mut escaped, original).unwrap();
            assert_eq!(unescape_tag_value(&escaped), original);
        }
    }

    #[test]
    fn test_color() {
        assert_eq!(
            Color::parse("#FF0000"),
            Some(Color { r: 255, g: 0, b: 0 })
        );
        assert_eq!(Color::parse("#1e90ff").unwrap().to_string(), "#1E90FF");
        assert_eq!(Color::parse("red"), None);
        assert_eq!(Color::parse("#FFF"), None);
        assert_eq!(Color::parse("#GGGGGG"), None);
    }

    #[test]
    fn test_unparsable_color_keeps_raw_value() {
        let tags = Tags::parse("color=red");
        assert_eq!(tags.color(), None);
        assert_eq!(
            tags.get(&TagName::Color),
            Some(&TagValue::Text("red".to_string()))
        );
        assert_eq!(tags.to_string(), "color=red");
        assert_eq!(Tags::parse(&tags.to_string()), tags);
    }

    #[test]
    fn test_empty_value_is_none() {
        let tags = Tags::parse("badge-info=;color=");
        assert_eq!(tags.len(), 2);
        assert!(tags.has(&TagName::BadgeInfo));
        assert_eq!(tags.get(&TagName::BadgeInfo), None);
        assert_eq!(tags.color(), None);
    }

    #[test]
    fn test_unrecognized_tag_kept() {
        let tags = Tags::parse("flags=;client-nonce=abc123");
        assert_eq!(
            tags.get_key("client-nonce"),
            Some(&TagValue::Unrecognized("abc123".to_string()))
        );
        assert!(tags.has(&TagName::Unrecognized("flags".to_string())));
    }

    #[test]
    fn test_malformed_pair_skipped() {
        assert_eq!(
            Tag::parse("novalue"),
            Err(TagError::Malformed("novalue".to_string()))
        );

        let tags = Tags::parse("mod=1;garbage;vip=0");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.flag(&TagName::Mod), Some(true));
        assert_eq!(tags.flag(&TagName::Vip), Some(false));
    }

    #[test]
    fn test_flags() {
        let tags = Tags::parse("subscriber=1;emote-only=0;slow=30;turbo=x");
        assert_eq!(tags.flag(&TagName::Subscriber), Some(true));
        assert_eq!(tags.flag(&TagName::EmoteOnly), Some(false));
        assert_eq!(tags.flag(&TagName::Slow), Some(true));
        assert_eq!(tags.flag(&TagName::Turbo), Some(false));
    }

    #[test]
    fn test_text_unescaped() {
        let tags = Tags::parse("display-name=Some\\sName;id=b34ccfc7-4977-403a-8a94-33c6bac34fb8");
        assert_eq!(tags.display_name(), Some("Some Name"));
        assert_eq!(tags.id(), Some("b34ccfc7-4977-403a-8a94-33c6bac34fb8"));
    }

    #[test]
    fn test_emote_sets_and_timestamp() {
        let tags = Tags::parse("emote-sets=0,33,50,237;tmi-sent-ts=1507246572675");
        assert_eq!(
            tags.emote_sets(),
            Some(&["0".to_string(), "33".to_string(), "50".to_string(), "237".to_string()][..])
        );
        assert_eq!(tags.sent_at().unwrap().timestamp_millis(), 1507246572675);
    }

    #[test]
    fn test_value_splits_on_first_equals() {
        let tags = Tags::parse("reply-parent-msg-body=a=b");
        assert_eq!(
            tags.get_key("reply-parent-msg-body").and_then(TagValue::as_text),
            Some("a=b")
        );
    }

    #[test]
    fn test_display_round_trip() {
        let raw = "badges=broadcaster/1;color=#FF0000;display-name=A\\sB;emotes=25:0-4;mod=1";
        let tags = Tags::parse(raw);
        assert_eq!(tags.to_string(), raw);
        assert_eq!(Tags::parse(&tags.to_string()), tags);
    }
}
