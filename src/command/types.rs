//! Inbound command types.
//!
//! Every verb the server can send maps onto exactly one [`Command`]
//! variant. Verbs the client does not understand become
//! [`Command::UNEXPECTED`]; that is a normal classification, not an error.

/// A classified inbound command with its payload.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Command {
    /// `JOIN #channel`, payload is the channel without its `#`.
    JOIN(String),
    /// `PART #channel`, payload is the channel without its `#`.
    PART(String),
    /// `NOTICE #channel`
    NOTICE(String),
    /// `CLEARCHAT #channel`
    CLEARCHAT(String),
    /// `HOSTTARGET #channel`
    HOSTTARGET(String),
    /// `PRIVMSG #channel`, the text is in the trailing parameter.
    PRIVMSG(String),
    /// `PING`
    PING,
    /// `CAP * ACK|NAK`, `true` when the request was acknowledged.
    CAP(bool),
    /// `GLOBALUSERSTATE`
    GLOBALUSERSTATE,
    /// `USERSTATE #channel`
    USERSTATE(String),
    /// `ROOMSTATE #channel`
    ROOMSTATE(String),
    /// `RECONNECT`, the server is about to drop the connection.
    RECONNECT,
    /// `CLEARMSG #channel`
    CLEARMSG(String),
    /// Numeric `421`, the server did not understand our command.
    UNSUPPORTED,
    /// Informational numerics (`002`-`004`, `353`, `366`, `372`, `375`, `376`).
    NUMERIC,
    /// Anything else.
    UNEXPECTED,
    /// Numeric `001`, carrying the nickname the server confirmed.
    AUTHENTICATED(String),
}

impl Command {
    /// The canonical name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::JOIN(_) => "JOIN",
            Command::PART(_) => "PART",
            Command::NOTICE(_) => "NOTICE",
            Command::CLEARCHAT(_) => "CLEARCHAT",
            Command::HOSTTARGET(_) => "HOSTTARGET",
            Command::PRIVMSG(_) => "PRIVMSG",
            Command::PING => "PING",
            Command::CAP(_) => "CAP",
            Command::GLOBALUSERSTATE => "GLOBALUSERSTATE",
            Command::USERSTATE(_) => "USERSTATE",
            Command::ROOMSTATE(_) => "ROOMSTATE",
            Command::RECONNECT => "RECONNECT",
            Command::CLEARMSG(_) => "CLEARMSG",
            Command::UNSUPPORTED => "UNSUPPORTED",
            Command::NUMERIC => "NUMERIC",
            Command::UNEXPECTED => "UNEXPECTED",
            Command::AUTHENTICATED(_) => "AUTHENTICATED",
        }
    }

    /// The channel this command refers to, for channel-scoped commands.
    pub fn channel(&self) -> Option<&str> {
        match self {
            Command::JOIN(c) | Command::PART(c) => Some(c),
            Command::NOTICE(c)
            | Command::CLEARCHAT(c)
            | Command::HOSTTARGET(c)
            | Command::PRIVMSG(c)
            | Command::USERSTATE(c)
            | Command::ROOMSTATE(c)
            | Command::CLEARMSG(c) => Some(c.strip_prefix('#').unwrap_or(c)),
            _ => None,
        }
    }
}
