//! `@login` mentions and per-person display settings.

use std::collections::HashMap;

use crate::message::Color;

use super::Segment;

/// A mention found in a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionMatch {
    /// UTF-16 offset of the `@`.
    pub start: usize,
    /// The login as written, without `@`.
    pub name: String,
    /// The matched text, `@` included.
    pub text: String,
}

/// How a person should be shown in chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonSettings {
    pub display_name: String,
    pub color: Color,
}

/// Looks up display settings by lowercase login.
pub trait PeopleLookup {
    fn lookup(&self, login: &str) -> Option<&PersonSettings>;
}

impl PeopleLookup for HashMap<String, PersonSettings> {
    fn lookup(&self, login: &str) -> Option<&PersonSettings> {
        self.get(login)
    }
}

/// Find `@login` mentions.
///
/// A mention starts with `@` at the start of the text or after whitespace,
/// followed by one or more ASCII letters, digits or `_`.
///
/// ```
/// use tmi_proto::segment::find_mentions;
///
/// let found = find_mentions("hi @Alice and bob@example.com");
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].start, 3);
/// assert_eq!(found[0].text, "@Alice");
/// ```
pub fn find_mentions(text: &str) -> Vec<MentionMatch> {
    let mut found = Vec::new();
    let mut unit = 0;
    let mut previous: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((byte, c)) = chars.next() {
        let at_boundary = previous.map_or(true, char::is_whitespace);
        if c == '@' && at_boundary {
            let name_start = byte + 1;
            let mut name_end = name_start;
            while let Some(&(_, next)) = chars.peek() {
                if !(next.is_ascii_alphanumeric() || next == '_') {
                    break;
                }
                name_end += 1;
                chars.next();
            }
            if name_end > name_start {
                found.push(MentionMatch {
                    start: unit,
                    name: text[name_start..name_end].to_owned(),
                    text: text[byte..name_end].to_owned(),
                });
                unit += 1 + (name_end - name_start);
                previous = text[..name_end].chars().next_back();
                continue;
            }
        }
        unit += c.len_utf16();
        previous = Some(c);
    }
    found
}

/// The segment shown for a mention.
///
/// Known people get their color and the first occurrence of the name in
/// the matched text replaced by their display name; unknown people are
/// shown as written, in white.
pub(crate) fn resolve<P: PeopleLookup + ?Sized>(mention: &MentionMatch, people: &P) -> Segment {
    match people.lookup(&mention.name.to_ascii_lowercase()) {
        Some(person) => Segment::Mention {
            display_name: mention.text.replacen(&mention.name, &person.display_name, 1),
            color: person.color,
        },
        None => Segment::Mention {
            display_name: mention.text.clone(),
            color: Color::WHITE,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_boundaries() {
        let found = find_mentions("@a x@b @ @c_1! @@d");
        let names: Vec<_> = found.iter().map(|m| (m.start, m.name.as_str())).collect();
        assert_eq!(names, [(0, "a"), (9, "c_1")]);
    }

    #[test]
    fn test_find_utf16_start() {
        let found = find_mentions("😀 @bob");
        assert_eq!(found[0].start, 3);
        assert_eq!(found[0].text, "@bob");
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        let mut people = HashMap::new();
        people.insert(
            "alice".to_string(),
            PersonSettings {
                display_name: "Alice_Wonder".to_string(),
                color: Color { r: 255, g: 0, b: 0 },
            },
        );

        let known = MentionMatch {
            start: 0,
            name: "ALICE".into(),
            text: "@ALICE".into(),
        };
        assert_eq!(
            resolve(&known, &people),
            Segment::Mention {
                display_name: "@Alice_Wonder".into(),
                color: Color { r: 255, g: 0, b: 0 },
            }
        );

        let unknown = MentionMatch {
            start: 0,
            name: "bob".into(),
            text: "@bob".into(),
        };
        assert_eq!(
            resolve(&unknown, &people),
            Segment::Mention {
                display_name: "@bob".into(),
                color: Color::WHITE,
            }
        );
    }
}
