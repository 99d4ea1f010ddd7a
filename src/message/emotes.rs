//! Protocol-native emote ranges carried by the `emotes` tag.
//!
//! Wire format: `25:0-4,12-16/1902:6-10`. Offsets are UTF-16 code units
//! into the message text and the end offset is inclusive.

use std::fmt;

use nom::{
    bytes::complete::take_till1,
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res},
    multi::separated_list1,
    sequence::separated_pair,
    IResult,
};
use tracing::debug;

/// One occurrence of a protocol-native emote in a message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmoteRange {
    /// Emote id as reported by the server.
    pub name: String,
    /// First UTF-16 code unit covered by the emote.
    pub text_start: usize,
    /// Last UTF-16 code unit covered by the emote (inclusive).
    pub text_end: usize,
}

impl EmoteRange {
    /// Exclusive end offset, `None` when it does not fit in a `usize`.
    pub fn end_exclusive(&self) -> Option<usize> {
        self.text_end.checked_add(1)
    }
}

/// All emote ranges of a message, in wire order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmoteRanges(Vec<EmoteRange>);

fn offset(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse::<usize>)(input)
}

fn group(input: &str) -> IResult<&str, (&str, Vec<(usize, usize)>)> {
    separated_pair(
        take_till1(|c| c == ':'),
        char(':'),
        separated_list1(char(','), separated_pair(offset, char('-'), offset)),
    )(input)
}

impl EmoteRanges {
    /// Decode the raw `emotes` tag value.
    ///
    /// A group that does not parse, or whose range ends before it starts,
    /// is skipped; the rest of the tag is still used.
    pub fn parse(raw: &str) -> Self {
        let mut ranges = Vec::new();
        for raw_group in raw.split('/').filter(|g| !g.is_empty()) {
            match all_consuming(group)(raw_group) {
                Ok((_, (name, sections))) => {
                    for (start, end) in sections {
                        if end < start || end == usize::MAX {
                            debug!(group = raw_group, "skipping out of range emote range");
                            continue;
                        }
                        ranges.push(EmoteRange {
                            name: name.to_owned(),
                            text_start: start,
                            text_end: end,
                        });
                    }
                }
                Err(_) => debug!(group = raw_group, "skipping malformed emote group"),
            }
        }
        Self(ranges)
    }

    /// Whether any range uses this emote id.
    pub fn has(&self, name: &str) -> bool {
        self.0.iter().any(|e| e.name == name)
    }

    /// First range using this emote id.
    pub fn get(&self, name: &str) -> Option<&EmoteRange> {
        self.0.iter().find(|e| e.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmoteRange> {
        self.0.iter()
    }

    /// Ranges ordered by ascending start offset.
    pub fn sorted(&self) -> Vec<&EmoteRange> {
        let mut sorted: Vec<_> = self.0.iter().collect();
        sorted.sort_by_key(|e| e.text_start);
        sorted
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<EmoteRange>> for EmoteRanges {
    fn from(ranges: Vec<EmoteRange>) -> Self {
        Self(ranges)
    }
}

impl fmt::Display for EmoteRanges {
    /// Re-encodes ranges grouped by id, in order of first appearance.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut order: Vec<&str> = Vec::new();
        for e in &self.0 {
            if !order.contains(&e.name.as_str()) {
                order.push(&e.name);
            }
        }
        for (i, name) in order.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}:", name)?;
            let mut first = true;
            for e in self.0.iter().filter(|e| e.name == *name) {
                if !first {
                    f.write_str(",")?;
                }
                first = false;
                write!(f, "{}-{}", e.text_start, e.text_end)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single() {
        let emotes = EmoteRanges::parse("25:0-4");
        assert_eq!(emotes.len(), 1);
        let e = emotes.get("25").unwrap();
        assert_eq!((e.text_start, e.text_end), (0, 4));
        assert_eq!(e.end_exclusive(), Some(5));
    }

    #[test]
    fn test_multiple_groups_and_ranges() {
        let emotes = EmoteRanges::parse("25:0-4,12-16/1902:6-10");
        assert_eq!(emotes.len(), 3);
        assert!(emotes.has("1902"));
        let starts: Vec<_> = emotes.sorted().iter().map(|e| e.text_start).collect();
        assert_eq!(starts, [0, 6, 12]);
    }

    #[test]
    fn test_emotesv2_ids() {
        let emotes = EmoteRanges::parse("emotesv2_dcd06b30a5c24f6eb871e8f5edbd44f7:0-5");
        assert_eq!(
            emotes.iter().next().unwrap().name,
            "emotesv2_dcd06b30a5c24f6eb871e8f5edbd44f7"
        );
    }

    #[test]
    fn test_malformed_group_skipped() {
        let emotes = EmoteRanges::parse("25:0-x/1902:6-10/nocolon/88:9-3");
        assert_eq!(emotes.len(), 1);
        assert!(emotes.has("1902"));
    }

    #[test]
    fn test_empty() {
        assert!(EmoteRanges::parse("").is_empty());
    }

    #[test]
    fn test_display() {
        let raw = "25:0-4,12-16/1902:6-10";
        assert_eq!(EmoteRanges::parse(raw).to_string(), raw);
    }

    #[test]
    fn test_max_end_offset_skipped() {
        let emotes = EmoteRanges::parse("25:0-18446744073709551615,6-10");
        assert_eq!(emotes.len(), 1);
        assert_eq!(emotes.get("25").unwrap().text_start, 6);

        let huge = EmoteRange {
            name: "25".to_owned(),
            text_start: 0,
            text_end: usize::MAX,
        };
        assert_eq!(huge.end_exclusive(), None);
    }
}
