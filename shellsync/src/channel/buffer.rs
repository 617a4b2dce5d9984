//! Pattern buffer accumulating child output with ANSI stripping.
//!
//! Incoming bytes are run through a `vte` parser so that colour codes and
//! cursor movement never reach the pattern matcher. The parser keeps its
//! state between chunks, so an escape sequence split across two reads is
//! still removed.

use bytes::{Buf, BytesMut};
use regex::bytes::Regex;
use vte::{Parser, Perform};

use super::patterns::{PatternMatch, first_match};

/// Collects the printable text out of a `vte` parse.
#[derive(Debug, Default)]
struct Printable {
    out: Vec<u8>,
}

impl Perform for Printable {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.push(byte);
        }
    }
}

/// Buffer for accumulating output and searching it for patterns.
///
/// Searches always cover the whole buffer so that the earliest match wins.
pub struct PatternBuffer {
    /// The accumulated, ANSI-free output.
    buffer: BytesMut,

    /// Escape-sequence parser state carried across chunks.
    parser: Parser,
}

impl PatternBuffer {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            parser: Parser::new(),
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let mut printable = Printable::default();
        self.parser.advance(&mut printable, data);
        self.buffer.extend_from_slice(&printable.out);
    }

    /// Find the earliest match of any pattern in the buffer.
    pub fn find_first(&self, patterns: &[Regex]) -> Option<PatternMatch> {
        first_match(patterns, &self.buffer)
    }

    /// Remove everything up to and including the match.
    ///
    /// Returns the bytes that preceded the match.
    pub fn consume_through(&mut self, m: &PatternMatch) -> Vec<u8> {
        let before = self.buffer.split_to(m.start).to_vec();
        self.buffer.advance(m.end - m.start);
        before
    }

    /// Take up to `max` bytes from the front of the buffer.
    pub fn take_front(&mut self, max: usize) -> Vec<u8> {
        let n = max.min(self.buffer.len());
        self.buffer.split_to(n).to_vec()
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.buffer.split().to_vec()
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer contents as a string (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("buffer", &self.as_str_lossy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::default();
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::default();
        buffer.extend(b"\x1b[32mGreen text\x1b[0m\r\n");
        assert_eq!(buffer.as_slice(), b"Green text\r\n");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut buffer = PatternBuffer::default();
        buffer.extend(b"a\x1b[3");
        buffer.extend(b"1mb");
        assert_eq!(buffer.as_slice(), b"ab");
    }

    #[test]
    fn test_consume_through_returns_before() {
        let mut buffer = PatternBuffer::default();
        buffer.extend(b"uptime\n14:02 up\n[TAG]$ rest");
        let prompt = Regex::new(r"\[TAG\]\$ ").unwrap();
        let m = buffer.find_first(&[prompt]).unwrap();
        assert_eq!(buffer.consume_through(&m), b"uptime\n14:02 up\n");
        assert_eq!(buffer.as_slice(), b"rest");
    }

    #[test]
    fn test_earliest_match_wins_over_later_one() {
        let mut buffer = PatternBuffer::default();
        buffer.extend(b"router#");
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"host$ ");

        let patterns = [Regex::new(r"\$ ").unwrap(), Regex::new(r"router#").unwrap()];
        let m = buffer.find_first(&patterns).unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.start, 0);
    }

    #[test]
    fn test_take_front_and_take() {
        let mut buffer = PatternBuffer::default();
        buffer.extend(b"abcdef");
        assert_eq!(buffer.take_front(2), b"ab");
        assert_eq!(buffer.take(), b"cdef");
        assert!(buffer.is_empty());
    }
}
