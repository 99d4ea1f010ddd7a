use super::types::Command;

/// First argument, or an empty string when the server sent none.
fn first(args: &[&str]) -> String {
    args.first().map(|s| (*s).to_owned()).unwrap_or_default()
}

/// First argument with a leading `#` removed.
fn channel(args: &[&str]) -> String {
    let raw = args.first().copied().unwrap_or_default();
    raw.strip_prefix('#').unwrap_or(raw).to_owned()
}

impl Command {
    /// Classify a verb and its middle parameters.
    ///
    /// Total: every input maps to some variant, unknown verbs to
    /// [`Command::UNEXPECTED`].
    pub fn new(cmd: &str, args: &[&str]) -> Command {
        let cmd_upper = cmd.to_ascii_uppercase();

        match cmd_upper.as_str() {
            "JOIN" => Command::JOIN(channel(args)),
            "PART" => Command::PART(channel(args)),
            "NOTICE" => Command::NOTICE(first(args)),
            "CLEARCHAT" => Command::CLEARCHAT(first(args)),
            "HOSTTARGET" => Command::HOSTTARGET(first(args)),
            "PRIVMSG" => Command::PRIVMSG(first(args)),
            "CLEARMSG" => Command::CLEARMSG(first(args)),
            "PING" => Command::PING,
            "CAP" => Command::CAP(args.get(1).is_some_and(|s| *s == "ACK")),
            "GLOBALUSERSTATE" => Command::GLOBALUSERSTATE,
            "USERSTATE" => Command::USERSTATE(first(args)),
            "ROOMSTATE" => Command::ROOMSTATE(first(args)),
            "RECONNECT" => Command::RECONNECT,
            "421" => Command::UNSUPPORTED,
            "001" => Command::AUTHENTICATED(first(args)),
            "002" | "003" | "004" | "353" | "366" | "372" | "375" | "376" => Command::NUMERIC,
            _ => Command::UNEXPECTED,
        }
    }

    /// Classify the text between the source and the trailing parameter,
    /// e.g. `PRIVMSG #bar` or `001 myuser`.
    pub fn classify(raw: &str) -> Command {
        let mut tokens = raw.split_ascii_whitespace();
        match tokens.next() {
            Some(verb) => {
                let args: Vec<&str> = tokens.collect();
                Command::new(verb, &args)
            }
            None => Command::UNEXPECTED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping() {
        assert_eq!(Command::classify("PING"), Command::PING);
    }

    #[test]
    fn test_authenticated_carries_nick() {
        assert_eq!(
            Command::classify("001 myuser"),
            Command::AUTHENTICATED("myuser".to_string())
        );
    }

    #[test]
    fn test_unknown_numeric() {
        assert_eq!(Command::classify("999"), Command::UNEXPECTED);
        assert_eq!(Command::classify("USERNOTICE #bar"), Command::UNEXPECTED);
    }

    #[test]
    fn test_informational_numerics() {
        for code in ["002", "003", "004", "353", "366", "372", "375", "376"] {
            assert_eq!(Command::classify(code), Command::NUMERIC, "{}", code);
        }
        assert_eq!(Command::classify("421 me WHO"), Command::UNSUPPORTED);
    }

    #[test]
    fn test_join_part_strip_sigil() {
        assert_eq!(Command::classify("JOIN #bar"), Command::JOIN("bar".to_string()));
        assert_eq!(Command::classify("PART #bar"), Command::PART("bar".to_string()));
    }

    #[test]
    fn test_channel_commands_keep_sigil() {
        assert_eq!(
            Command::classify("PRIVMSG #bar"),
            Command::PRIVMSG("#bar".to_string())
        );
        assert_eq!(
            Command::classify("ROOMSTATE #bar"),
            Command::ROOMSTATE("#bar".to_string())
        );
    }

    #[test]
    fn test_cap() {
        assert_eq!(Command::classify("CAP * ACK"), Command::CAP(true));
        assert_eq!(Command::classify("CAP * NAK"), Command::CAP(false));
        assert_eq!(Command::classify("CAP"), Command::CAP(false));
    }

    #[test]
    fn test_missing_argument() {
        assert_eq!(Command::classify("JOIN"), Command::JOIN(String::new()));
        assert_eq!(Command::classify("001"), Command::AUTHENTICATED(String::new()));
    }

    #[test]
    fn test_empty_and_case() {
        assert_eq!(Command::classify(""), Command::UNEXPECTED);
        assert_eq!(Command::classify("   "), Command::UNEXPECTED);
        assert_eq!(Command::classify("ping"), Command::PING);
    }
}
