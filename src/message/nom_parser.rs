//! Nom-based line splitter.
//!
//! Splits one raw line into its tag block, source, command text and
//! trailing parameter without allocating. Typed decoding of each piece
//! happens in [`Message::decode`](super::Message::decode).
//!
//! ```text
//! [@tags ][:source ]<verb [params...]>[:trailing]
//! ```
//!
//! The trailing parameter starts at the first `:` after the source, so a
//! middle parameter can never contain a colon. That matches what the chat
//! server sends.

use nom::{
    bytes::complete::{take_till, take_until},
    character::complete::char,
    combinator::opt,
    sequence::{preceded, terminated},
    IResult,
};

/// Tag block after `@`, up to the first space. The space is consumed.
fn parse_tags(input: &str) -> IResult<&str, &str> {
    terminated(preceded(char('@'), take_till(|c| c == ' ')), opt(char(' ')))(input)
}

/// Source after `:`, up to the first space. The space is consumed.
fn parse_source(input: &str) -> IResult<&str, &str> {
    terminated(preceded(char(':'), take_till(|c| c == ' ')), opt(char(' ')))(input)
}

/// Everything before the first `:`, consuming the colon.
fn parse_command(input: &str) -> IResult<&str, &str> {
    terminated(take_until(":"), char(':'))(input)
}

/// A split line with borrowed slices into the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    /// Raw tag block (without the leading `@`), if present.
    pub tags: Option<&'a str>,
    /// Raw source (without the leading `:`), if present.
    pub source: Option<&'a str>,
    /// Verb and middle parameters, trimmed.
    pub command: &'a str,
    /// Trailing parameter, untrimmed.
    pub trailing: Option<&'a str>,
}

/// Split a complete line.
pub fn parse_line(input: &str) -> IResult<&str, ParsedLine<'_>> {
    let (input, tags) = opt(parse_tags)(input)?;
    let (input, source) = opt(parse_source)(input)?;

    let (command, trailing) = match parse_command(input) {
        Ok((rest, command)) => (command.trim(), Some(rest)),
        Err(_) => (input.trim(), None),
    };

    Ok((
        "",
        ParsedLine {
            tags,
            source,
            command,
            trailing,
        },
    ))
}

impl<'a> ParsedLine<'a> {
    /// Split `input`, never failing.
    ///
    /// A trailing CR/LF is ignored. Input the splitter cannot make sense
    /// of yields an empty command, which classifies as unexpected.
    pub fn parse(input: &'a str) -> Self {
        let input = input.trim_end_matches(['\r', '\n']);
        match parse_line(input) {
            Ok((_, line)) => line,
            Err(_) => ParsedLine {
                tags: None,
                source: None,
                command: "",
                trailing: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_command() {
        let line = ParsedLine::parse("PING");
        assert_eq!(line.command, "PING");
        assert!(line.tags.is_none());
        assert!(line.source.is_none());
        assert!(line.trailing.is_none());
    }

    #[test]
    fn test_parse_ping_with_trailing() {
        let line = ParsedLine::parse("PING :tmi.twitch.tv\r\n");
        assert_eq!(line.command, "PING");
        assert_eq!(line.trailing, Some("tmi.twitch.tv"));
    }

    #[test]
    fn test_parse_with_source() {
        let line = ParsedLine::parse(":foo!foo@foo.tmi.twitch.tv PRIVMSG #bar :Kappa hi");
        assert_eq!(line.source, Some("foo!foo@foo.tmi.twitch.tv"));
        assert_eq!(line.command, "PRIVMSG #bar");
        assert_eq!(line.trailing, Some("Kappa hi"));
    }

    #[test]
    fn test_parse_with_tags() {
        let line = ParsedLine::parse("@badge-info=;color= :tmi.twitch.tv GLOBALUSERSTATE");
        assert_eq!(line.tags, Some("badge-info=;color="));
        assert_eq!(line.source, Some("tmi.twitch.tv"));
        assert_eq!(line.command, "GLOBALUSERSTATE");
        assert_eq!(line.trailing, None);
    }

    #[test]
    fn test_trailing_not_trimmed() {
        let line = ParsedLine::parse(":a!a@a PRIVMSG #bar :  spaced out  ");
        assert_eq!(line.trailing, Some("  spaced out  "));
    }

    #[test]
    fn test_trailing_keeps_later_colons() {
        let line = ParsedLine::parse(":a!a@a PRIVMSG #bar :time: 12:30");
        assert_eq!(line.trailing, Some("time: 12:30"));
    }

    #[test]
    fn test_empty_trailing() {
        let line = ParsedLine::parse("PRIVMSG #bar :");
        assert_eq!(line.trailing, Some(""));
    }

    #[test]
    fn test_numeric() {
        let line = ParsedLine::parse(":tmi.twitch.tv 001 myuser :Welcome, GLHF!");
        assert_eq!(line.command, "001 myuser");
        assert_eq!(line.trailing, Some("Welcome, GLHF!"));
    }

    #[test]
    fn test_tags_without_space() {
        let line = ParsedLine::parse("@a=b");
        assert_eq!(line.tags, Some("a=b"));
        assert_eq!(line.command, "");
    }

    #[test]
    fn test_empty_input() {
        let line = ParsedLine::parse("");
        assert_eq!(line.command, "");
        assert!(line.trailing.is_none());
    }
}
