//! Utility functions for chat text handling.
//!
//! Twitch reports emote positions in UTF-16 code units, while Rust strings
//! are indexed by byte. [`Utf16Index`] translates between the two without
//! ever splitting a character.

/// Maximum length of a single protocol line, excluding the CRLF.
pub const MAX_LINE_LEN: usize = 8191;

/// Number of UTF-16 code units needed to encode `s`.
#[inline]
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Returns the byte offset of every non-overlapping occurrence of `needle`.
///
/// After a match the search resumes past the end of that match, so
/// `"aaaa"` contains `"aa"` twice, not three times. An empty needle
/// matches nowhere.
///
/// # Examples
///
/// ```
/// use tmi_proto::util::index_of_all;
///
/// assert_eq!(index_of_all("LUL and LUL", "LUL"), vec![0, 8]);
/// assert_eq!(index_of_all("aaaa", "aa"), vec![0, 2]);
/// assert!(index_of_all("abc", "").is_empty());
/// ```
pub fn index_of_all(haystack: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    haystack.match_indices(needle).map(|(i, _)| i).collect()
}

/// Maps UTF-16 code unit offsets of a string onto byte offsets.
#[derive(Debug, Clone)]
pub struct Utf16Index<'a> {
    text: &'a str,
    /// `(utf16 offset, byte offset)` of every char start, ascending.
    starts: Vec<(usize, usize)>,
    len: usize,
}

impl<'a> Utf16Index<'a> {
    /// Build the index for `text`.
    pub fn new(text: &'a str) -> Self {
        let mut starts = Vec::with_capacity(text.len());
        let mut unit = 0;
        for (byte, c) in text.char_indices() {
            starts.push((unit, byte));
            unit += c.len_utf16();
        }
        Self {
            text,
            starts,
            len: unit,
        }
    }

    /// The indexed text.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Length of the text in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte offset of UTF-16 offset `unit`.
    ///
    /// Returns `None` past the end of the text or when `unit` points into the
    /// middle of a surrogate pair.
    pub fn byte_offset(&self, unit: usize) -> Option<usize> {
        if unit == self.len {
            return Some(self.text.len());
        }
        self.starts
            .binary_search_by_key(&unit, |&(u, _)| u)
            .ok()
            .map(|i| self.starts[i].1)
    }

    /// UTF-16 offset of byte offset `byte`, which must be a char boundary.
    pub fn unit_offset(&self, byte: usize) -> Option<usize> {
        if byte == self.text.len() {
            return Some(self.len);
        }
        self.starts
            .binary_search_by_key(&byte, |&(_, b)| b)
            .ok()
            .map(|i| self.starts[i].0)
    }

    /// The text between UTF-16 offsets `start` (inclusive) and `end` (exclusive).
    pub fn slice(&self, start: usize, end: usize) -> Option<&'a str> {
        if start > end {
            return None;
        }
        let from = self.byte_offset(start)?;
        let to = self.byte_offset(end)?;
        self.text.get(from..to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_len() {
        assert_eq!(utf16_len("hello"), 5);
        assert_eq!(utf16_len("héllo"), 5);
        // Astral plane characters take two code units.
        assert_eq!(utf16_len("👋"), 2);
        assert_eq!(utf16_len(""), 0);
    }

    #[test]
    fn test_index_of_all() {
        assert_eq!(index_of_all("abc abc", "abc"), vec![0, 4]);
        assert_eq!(index_of_all("abc", "x"), Vec::<usize>::new());
        assert_eq!(index_of_all("aaa", "aa"), vec![0]);
    }

    #[test]
    fn test_index_ascii() {
        let idx = Utf16Index::new("Kappa hi");
        assert_eq!(idx.len(), 8);
        assert_eq!(idx.slice(0, 5), Some("Kappa"));
        assert_eq!(idx.slice(5, 8), Some(" hi"));
        assert_eq!(idx.byte_offset(9), None);
    }

    #[test]
    fn test_index_astral() {
        // "👋" occupies UTF-16 offsets 0..2 and bytes 0..4.
        let idx = Utf16Index::new("👋 Kappa");
        assert_eq!(idx.len(), 8);
        assert_eq!(idx.byte_offset(1), None);
        assert_eq!(idx.byte_offset(2), Some(4));
        assert_eq!(idx.slice(3, 8), Some("Kappa"));
        assert_eq!(idx.unit_offset(5), Some(3));
    }

    #[test]
    fn test_index_empty() {
        let idx = Utf16Index::new("");
        assert!(idx.is_empty());
        assert_eq!(idx.slice(0, 0), Some(""));
        assert_eq!(idx.byte_offset(0), Some(0));
    }

    #[test]
    fn test_slice_reversed() {
        let idx = Utf16Index::new("abc");
        assert_eq!(idx.slice(2, 1), None);
    }
}
