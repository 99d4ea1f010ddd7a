//! Line framing for stream and message oriented transports.
//!
//! Stream transports (TCP, in-memory pipes) deliver bytes and may split a
//! line across reads; [`LineCodec`] buffers until a terminator arrives.
//! Message transports (WebSocket) deliver whole frames that may carry
//! several lines; [`split_records`] breaks one frame apart.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::util::MAX_LINE_LEN;

/// A `\n` / `\r\n` delimited UTF-8 line codec.
///
/// Blank lines are skipped. Lines longer than the configured limit are
/// rejected with [`ProtocolError::LineTooLong`].
#[derive(Debug, Clone)]
pub struct LineCodec {
    /// Index in the buffer already scanned for a terminator.
    next_index: usize,
    max_len: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    fn finish(raw: &[u8]) -> Result<Option<String>, ProtocolError> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8(raw.to_vec())?))
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        loop {
            let newline = src[self.next_index..].iter().position(|b| *b == b'\n');
            match newline {
                Some(offset) => {
                    let end = self.next_index + offset;
                    self.next_index = 0;
                    let raw = src.split_to(end + 1);
                    let raw = &raw[..end];
                    if raw.len() > self.max_len + 1 {
                        return Err(ProtocolError::LineTooLong(raw.len()));
                    }
                    if let Some(line) = Self::finish(raw)? {
                        return Ok(Some(line));
                    }
                }
                None => {
                    if src.len() > self.max_len + 1 {
                        let len = src.len();
                        src.clear();
                        self.next_index = 0;
                        return Err(ProtocolError::LineTooLong(len));
                    }
                    self.next_index = src.len();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        // An unterminated final line is still a record.
        self.next_index = 0;
        if src.is_empty() {
            return Ok(None);
        }
        let raw = src.split_to(src.len());
        Self::finish(&raw)
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);
        dst.reserve(line.len() + 2);
        dst.put_slice(line.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Split one transport frame into its records.
///
/// The end of the frame terminates its last record even without a line
/// terminator. Empty records are dropped.
///
/// ```
/// use tmi_proto::line::split_records;
///
/// let frame = "PING :tmi.twitch.tv\r\n:tmi.twitch.tv 001 me :Welcome\r\n";
/// let lines: Vec<_> = split_records(frame).collect();
/// assert_eq!(lines, ["PING :tmi.twitch.tv", ":tmi.twitch.tv 001 me :Welcome"]);
/// ```
pub fn split_records(frame: &str) -> impl Iterator<Item = &str> {
    frame
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
}
