//! Pattern matching utilities for expect-style prompt detection.

use regex::bytes::Regex;

/// A match of one pattern out of an ordered pattern list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    /// Index of the matching pattern in the list.
    pub index: usize,

    /// Byte offset where the match starts.
    pub start: usize,

    /// Byte offset where the match ends.
    pub end: usize,
}

/// Find the first match among `patterns` in `data`.
///
/// The match that starts earliest in `data` wins. When two patterns match at
/// the same offset, the one listed first wins. Because the expect loop tests
/// the buffer after every chunk and consumes through each match, this picks
/// the pattern whose text arrived first on the stream.
pub fn first_match(patterns: &[Regex], data: &[u8]) -> Option<PatternMatch> {
    let mut best: Option<PatternMatch> = None;
    for (index, pattern) in patterns.iter().enumerate() {
        if let Some(m) = pattern.find(data) {
            let earlier = best.is_none_or(|b| m.start() < b.start);
            if earlier {
                best = Some(PatternMatch {
                    index,
                    start: m.start(),
                    end: m.end(),
                });
            }
        }
    }
    best
}

/// Compile a case-insensitive pattern.
pub fn compile_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){}", pattern))
}
