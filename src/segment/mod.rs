//! Text segmentation: turn a chat message into an ordered list of plain
//! text, emote and mention segments.
//!
//! Matches are collected from several sources, each giving UTF-16 ranges
//! into the original text. When ranges from different sources overlap the
//! higher priority source wins: protocol-native emotes, then catalog
//! emotes, then mentions. Within a source the earlier range wins.
//!
//! ```
//! use tmi_proto::message::EmoteRanges;
//! use tmi_proto::segment::{Segment, Segmenter};
//!
//! let segments = Segmenter::new("Kappa hi")
//!     .with_native_emotes(&EmoteRanges::parse("25:0-4"))
//!     .segments();
//! assert_eq!(
//!     segments,
//!     [
//!         Segment::Emote {
//!             display_name: "Kappa".into(),
//!             image_url: "https://static-cdn.jtvnw.net/emoticons/v2/25/default/light/1.0".into(),
//!         },
//!         Segment::text(" hi"),
//!     ]
//! );
//! ```

mod mentions;

pub use self::mentions::{find_mentions, MentionMatch, PeopleLookup, PersonSettings};

use tracing::debug;

use crate::catalog::EmoteCatalog;
use crate::message::{Color, EmoteRanges, Message, Tags};
use crate::util::{utf16_len, Utf16Index};

/// Image url of a protocol-native emote.
pub fn native_emote_url(id: &str) -> String {
    format!("https://static-cdn.jtvnw.net/emoticons/v2/{}/default/light/1.0", id)
}

/// One piece of a rendered message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Text { content: String },
    Emote { display_name: String, image_url: String },
    Mention { display_name: String, color: Color },
}

impl Segment {
    pub fn text(content: impl Into<String>) -> Self {
        Segment::Text {
            content: content.into(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Segment::Text { .. })
    }

    /// The text shown for this segment.
    pub fn display_text(&self) -> &str {
        match self {
            Segment::Text { content } => content,
            Segment::Emote { display_name, .. } | Segment::Mention { display_name, .. } => {
                display_name
            }
        }
    }
}

/// Where a match came from. Ordered by priority, highest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchSource {
    Native,
    Catalog,
    Mention,
}

/// A matched range of the message and the segment that replaces it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    /// UTF-16 offset of the first covered code unit.
    pub start: usize,
    /// UTF-16 offset one past the last covered code unit.
    pub end: usize,
    pub source: MatchSource,
    pub segment: Segment,
}

impl Span {
    fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Collects matches for one message and renders its segments.
#[derive(Debug, Clone)]
pub struct Segmenter<'a> {
    index: Utf16Index<'a>,
    spans: Vec<Span>,
}

impl<'a> Segmenter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            index: Utf16Index::new(text),
            spans: Vec::new(),
        }
    }

    /// A segmenter over the chat text of `msg` with its native emotes
    /// already added. `None` when the message carries no chat text.
    pub fn for_message(msg: &'a Message) -> Option<Self> {
        let segmenter = Self::new(msg.text()?);
        Some(match msg.tags.as_ref().and_then(Tags::emotes) {
            Some(emotes) => segmenter.with_native_emotes(emotes),
            None => segmenter,
        })
    }

    /// Add a candidate span if it covers a valid, non-empty range.
    fn push(&mut self, start: usize, end: usize, source: MatchSource, segment: Segment) {
        if start >= end || self.index.slice(start, end).is_none() {
            debug!(start, end, ?source, "dropping range outside the message");
            return;
        }
        self.spans.push(Span {
            start,
            end,
            source,
            segment,
        });
    }

    /// Add protocol-native emotes from the `emotes` tag.
    pub fn with_native_emotes(mut self, emotes: &EmoteRanges) -> Self {
        for emote in emotes.sorted() {
            let start = emote.text_start;
            let Some(end) = emote.end_exclusive() else {
                debug!(id = %emote.name, start, "dropping emote range ending past usize::MAX");
                continue;
            };
            let Some(covered) = self.index.slice(start, end) else {
                debug!(id = %emote.name, start, end, "dropping emote range outside the message");
                continue;
            };
            let segment = Segment::Emote {
                display_name: covered.to_owned(),
                image_url: native_emote_url(&emote.name),
            };
            self.push(start, end, MatchSource::Native, segment);
        }
        self
    }

    /// Add whole-token matches of catalog emotes.
    pub fn with_catalog(mut self, catalog: &EmoteCatalog) -> Self {
        let text = self.index.text();
        for found in catalog.scan(text) {
            let segment = Segment::Emote {
                display_name: found.entry.name.clone(),
                image_url: found.entry.image_url(),
            };
            self.push(found.start, found.end, MatchSource::Catalog, segment);
        }
        self
    }

    /// Add mentions, styled through `people`.
    ///
    /// A mention whose text does not appear at its offset is dropped.
    pub fn with_mentions<P>(mut self, mentions: &[MentionMatch], people: &P) -> Self
    where
        P: PeopleLookup + ?Sized,
    {
        for mention in mentions {
            let Some(end) = mention.start.checked_add(utf16_len(&mention.text)) else {
                debug!(start = mention.start, "dropping mention ending past usize::MAX");
                continue;
            };
            if self.index.slice(mention.start, end) != Some(mention.text.as_str()) {
                debug!(start = mention.start, text = %mention.text, "dropping misplaced mention");
                continue;
            }
            let segment = mentions::resolve(mention, people);
            self.push(mention.start, end, MatchSource::Mention, segment);
        }
        self
    }

    /// The spans that survive overlap resolution, in text order.
    pub fn spans(&self) -> Vec<Span> {
        let mut candidates: Vec<&Span> = self.spans.iter().collect();
        candidates.sort_by_key(|span| (span.source, span.start));

        let mut accepted: Vec<Span> = Vec::with_capacity(candidates.len());
        for span in candidates {
            if let Some(winner) = accepted.iter().find(|a| a.overlaps(span)) {
                debug!(
                    start = span.start,
                    end = span.end,
                    source = ?span.source,
                    winner = ?winner.source,
                    "dropping overlapping range"
                );
                continue;
            }
            accepted.push(span.clone());
        }
        accepted.sort_by_key(|span| (span.start, span.source));
        accepted
    }

    /// Render the message.
    ///
    /// Gaps between spans become text segments. Without any span the
    /// result is the whole message as a single text segment.
    pub fn segments(&self) -> Vec<Segment> {
        let spans = self.spans();
        let text = self.index.text();
        if spans.is_empty() {
            return vec![Segment::text(text)];
        }

        let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
        let mut cursor = 0;
        for span in spans {
            if span.start > cursor {
                if let Some(gap) = self.index.slice(cursor, span.start) {
                    segments.push(Segment::text(gap));
                }
            }
            segments.push(span.segment);
            cursor = span.end;
        }
        if cursor < self.index.len() {
            if let Some(rest) = self.index.slice(cursor, self.index.len()) {
                segments.push(Segment::text(rest));
            }
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::message::EmoteRange;

    fn emote(name: &str) -> Segment {
        Segment::Emote {
            display_name: name.to_owned(),
            image_url: String::new(),
        }
    }

    fn shape(segments: &[Segment]) -> Vec<String> {
        segments
            .iter()
            .map(|s| match s {
                Segment::Text { content } => format!("T({})", content),
                Segment::Emote { display_name, .. } => format!("E({})", display_name),
                Segment::Mention { display_name, .. } => format!("M({})", display_name),
            })
            .collect()
    }

    #[test]
    fn test_no_ranges() {
        assert_eq!(Segmenter::new("just text").segments(), [Segment::text("just text")]);
        assert_eq!(Segmenter::new("").segments(), [Segment::text("")]);
    }

    #[test]
    fn test_native_emotes_gaps_and_suffix() {
        let segments = Segmenter::new("hi Kappa and Kappa!")
            .with_native_emotes(&EmoteRanges::parse("25:13-17,3-7"))
            .segments();
        assert_eq!(
            shape(&segments),
            ["T(hi )", "E(Kappa)", "T( and )", "E(Kappa)", "T(!)"]
        );
    }

    #[test]
    fn test_adjacent_emotes() {
        let segments = Segmenter::new("KappaKappa")
            .with_native_emotes(&EmoteRanges::parse("25:0-4,5-9"))
            .segments();
        assert_eq!(shape(&segments), ["E(Kappa)", "E(Kappa)"]);
    }

    #[test]
    fn test_out_of_range_dropped() {
        let segments = Segmenter::new("short")
            .with_native_emotes(&EmoteRanges::parse("25:2-40"))
            .segments();
        assert_eq!(segments, [Segment::text("short")]);
    }

    #[test]
    fn test_surrogate_split_dropped() {
        // The emoji occupies units 0..2; a range ending at unit 0 splits it.
        let segments = Segmenter::new("😀x")
            .with_native_emotes(&EmoteRanges::parse("1:0-0"))
            .segments();
        assert_eq!(segments, [Segment::text("😀x")]);
    }

    #[test]
    fn test_utf16_offsets() {
        let segments = Segmenter::new("😀 Kappa")
            .with_native_emotes(&EmoteRanges::parse("25:3-7"))
            .segments();
        assert_eq!(shape(&segments), ["T(😀 )", "E(Kappa)"]);
    }

    #[test]
    fn test_overlap_precedence() {
        let mut segmenter = Segmenter::new("@Kappa hello");
        segmenter.push(1, 6, MatchSource::Native, emote("Kappa"));
        segmenter.push(0, 6, MatchSource::Mention, Segment::Mention {
            display_name: "@Kappa".into(),
            color: Color::WHITE,
        });
        segmenter.push(7, 12, MatchSource::Catalog, emote("hello"));
        segmenter.push(8, 10, MatchSource::Catalog, emote("el"));

        let spans = segmenter.spans();
        let kept: Vec<_> = spans.iter().map(|s| (s.start, s.source)).collect();
        assert_eq!(kept, [(1, MatchSource::Native), (7, MatchSource::Catalog)]);
        assert_eq!(
            shape(&segmenter.segments()),
            ["T(@)", "E(Kappa)", "T( )", "E(hello)"]
        );
    }

    #[test]
    fn test_mentions() {
        let mut people = HashMap::new();
        people.insert(
            "bob".to_string(),
            PersonSettings {
                display_name: "Bobby".to_string(),
                color: Color { r: 0, g: 128, b: 0 },
            },
        );
        let text = "hey @bob and @carol";
        let segments = Segmenter::new(text)
            .with_mentions(&find_mentions(text), &people)
            .segments();
        assert_eq!(
            segments,
            [
                Segment::text("hey "),
                Segment::Mention {
                    display_name: "@Bobby".into(),
                    color: Color { r: 0, g: 128, b: 0 },
                },
                Segment::text(" and "),
                Segment::Mention {
                    display_name: "@carol".into(),
                    color: Color::WHITE,
                },
            ]
        );
    }

    #[test]
    fn test_misplaced_mention_dropped() {
        let mention = MentionMatch {
            start: 2,
            name: "bob".into(),
            text: "@bob".into(),
        };
        let segments = Segmenter::new("@bob")
            .with_mentions(&[mention], &HashMap::<String, PersonSettings>::new())
            .segments();
        assert_eq!(segments, [Segment::text("@bob")]);
    }

    #[test]
    fn test_for_message() {
        let msg = Message::decode("@emotes=25:0-4 :a!a@a.tmi.twitch.tv PRIVMSG #b :Kappa hi");
        let segments = Segmenter::for_message(&msg).unwrap().segments();
        assert_eq!(shape(&segments), ["E(Kappa)", "T( hi)"]);
        assert!(Segmenter::for_message(&Message::decode("PING :x")).is_none());
    }

    #[test]
    fn test_oversized_emote_offsets_are_dropped() {
        let msg = Message::decode(
            "@emotes=25:0-18446744073709551615 :a!a@a.tmi.twitch.tv PRIVMSG #b :Kappa hi",
        );
        let segments = Segmenter::for_message(&msg).unwrap().segments();
        assert_eq!(segments, [Segment::text("Kappa hi")]);

        let huge = EmoteRanges::from(vec![EmoteRange {
            name: "25".into(),
            text_start: usize::MAX,
            text_end: usize::MAX,
        }]);
        let segments = Segmenter::new("Kappa hi").with_native_emotes(&huge).segments();
        assert_eq!(segments, [Segment::text("Kappa hi")]);
    }

    #[test]
    fn test_native_url() {
        assert_eq!(
            native_emote_url("emotesv2_abc"),
            "https://static-cdn.jtvnw.net/emoticons/v2/emotesv2_abc/default/light/1.0"
        );
    }
}
