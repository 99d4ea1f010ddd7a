use std::borrow::Cow;
use std::fmt::{self, Write};

/// A command the client sends to the server.
///
/// Channel names are stored without their `#`; serialization adds it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Request {
    /// `CAP REQ :cap1 cap2 ...`
    CAP(Vec<String>),
    /// `PASS password`
    PASS(String),
    /// `NICK nickname`
    NICK(String),
    /// `JOIN #channel`
    JOIN(String),
    /// `PART #channel`
    PART(String),
    /// `PRIVMSG #channel :text`
    PRIVMSG(String, String),
    /// `PONG :server`
    PONG(String),
    /// A pre-formatted line, sent verbatim.
    Raw(String),
}

impl Request {
    /// `JOIN` for a room given with or without its `#`, in any case.
    pub fn join(room: &str) -> Self {
        Request::JOIN(normalize_channel(room))
    }

    /// `PART` for a room given with or without its `#`, in any case.
    pub fn part(room: &str) -> Self {
        Request::PART(normalize_channel(room))
    }

    pub fn privmsg(channel: &str, text: &str) -> Self {
        Request::PRIVMSG(normalize_channel(channel), text.to_owned())
    }

    /// `PASS oauth:<token>`; a token that already carries the `oauth:` prefix
    /// is used as is.
    pub fn pass(token: &str) -> Self {
        let token = token.strip_prefix("oauth:").unwrap_or(token);
        Request::PASS(format!("oauth:{}", token))
    }

    /// The verb this request is sent with.
    pub fn verb(&self) -> &str {
        match self {
            Request::CAP(_) => "CAP",
            Request::PASS(_) => "PASS",
            Request::NICK(_) => "NICK",
            Request::JOIN(_) => "JOIN",
            Request::PART(_) => "PART",
            Request::PRIVMSG(..) => "PRIVMSG",
            Request::PONG(_) => "PONG",
            Request::Raw(line) => line.split(' ').next().unwrap_or_default(),
        }
    }
}

/// Lowercase a room name and drop a leading `#`.
pub(crate) fn normalize_channel(room: &str) -> String {
    middle_param(room.trim())
        .trim_start_matches('#')
        .to_ascii_lowercase()
}

/// A middle parameter with whitespace and control characters removed.
pub(crate) fn middle_param(param: &str) -> Cow<'_, str> {
    if param.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Cow::Owned(
            param
                .chars()
                .filter(|c| !c.is_whitespace() && !c.is_control())
                .collect(),
        )
    } else {
        Cow::Borrowed(param)
    }
}

/// A trailing parameter with CR, LF and NUL replaced by spaces.
pub(crate) fn trailing_param(text: &str) -> Cow<'_, str> {
    if text.contains(['\r', '\n', '\0']) {
        Cow::Owned(text.replace(['\r', '\n', '\0'], " "))
    } else {
        Cow::Borrowed(text)
    }
}

/// Write a command with a freeform (always colon-prefixed) trailing argument.
fn write_cmd_freeform(f: &mut fmt::Formatter<'_>, cmd: &str, args: &[&str]) -> fmt::Result {
    match args.split_last() {
        Some((suffix, middle)) => {
            f.write_str(cmd)?;
            for arg in middle {
                f.write_char(' ')?;
                f.write_str(arg)?;
            }
            f.write_str(" :")?;
            f.write_str(suffix)
        }
        None => f.write_str(cmd),
    }
}

impl fmt::Display for Request {
    /// Renders exactly one record: parameters never carry a line break.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::CAP(caps) => {
                let caps: Vec<_> = caps.iter().map(|c| middle_param(c)).collect();
                let caps = caps.join(" ");
                write_cmd_freeform(f, "CAP", &["REQ", caps.as_str()])
            }
            Request::PASS(password) => write!(f, "PASS {}", middle_param(password)),
            Request::NICK(nick) => write!(f, "NICK {}", middle_param(nick)),
            Request::JOIN(channel) => write!(f, "JOIN #{}", middle_param(channel)),
            Request::PART(channel) => write!(f, "PART #{}", middle_param(channel)),
            Request::PRIVMSG(channel, text) => {
                let target = format!("#{}", middle_param(channel));
                let text = trailing_param(text);
                write_cmd_freeform(f, "PRIVMSG", &[target.as_str(), text.as_ref()])
            }
            Request::PONG(server) => {
                write_cmd_freeform(f, "PONG", &[trailing_param(server).as_ref()])
            }
            Request::Raw(line) => f.write_str(&trailing_param(line)),
        }
    }
}
