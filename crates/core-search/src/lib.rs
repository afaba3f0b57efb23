//! Literal find over a document buffer.
//!
//! User text is never a pattern language: the query is compiled through
//! `regex::escape`, and the regex engine only contributes Unicode case folding
//! for case-insensitive search. Whole-word filtering is done on the matched
//! span (neighbouring chars must be non-word or a buffer edge), so patterns
//! that start or end with punctuation behave the same as plain words.
//!
//! Offsets in and out of this crate are char offsets into the buffer.
//! A `SearchMatch` is stale as soon as the buffer changes.

use bitflags::bitflags;
use core_text::{Buffer, Selection, is_word_char};
use regex::{Regex, RegexBuilder};
use std::ops::Range;
use thiserror::Error;
use tracing::trace;

pub mod replace;

pub use replace::{ReplaceOne, replace_all, replace_one};

bitflags! {
    /// Find/replace dialog options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SearchFlags: u8 {
        const CASE_SENSITIVE = 1 << 0;
        const WHOLE_WORD = 1 << 1;
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    /// Empty pattern; the caller must re-prompt.
    #[error("search pattern is empty")]
    InvalidPattern,
    #[error("search pattern could not be compiled: {0}")]
    Compile(#[from] regex::Error),
}

/// A compiled, immutable find query.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pattern: String,
    case_sensitive: bool,
    whole_word: bool,
    regex: Regex,
}

/// Compile `pattern` as literal text.
pub fn compile(
    pattern: &str,
    case_sensitive: bool,
    whole_word: bool,
) -> Result<SearchQuery, SearchError> {
    if pattern.is_empty() {
        return Err(SearchError::InvalidPattern);
    }
    let regex = RegexBuilder::new(&regex::escape(pattern))
        .case_insensitive(!case_sensitive)
        .build()?;
    Ok(SearchQuery {
        pattern: pattern.to_owned(),
        case_sensitive,
        whole_word,
        regex,
    })
}

impl SearchQuery {
    pub fn new(pattern: &str, flags: SearchFlags) -> Result<Self, SearchError> {
        compile(
            pattern,
            flags.contains(SearchFlags::CASE_SENSITIVE),
            flags.contains(SearchFlags::WHOLE_WORD),
        )
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
    pub fn whole_word(&self) -> bool {
        self.whole_word
    }
    pub fn flags(&self) -> SearchFlags {
        let mut flags = SearchFlags::empty();
        flags.set(SearchFlags::CASE_SENSITIVE, self.case_sensitive);
        flags.set(SearchFlags::WHOLE_WORD, self.whole_word);
        flags
    }

    /// First accepted match in `text` starting at or after byte `from`.
    pub(crate) fn next_in(&self, text: &str, mut from: usize) -> Option<Range<usize>> {
        while from <= text.len() {
            let m = self.regex.find_at(text, from)?;
            if !self.whole_word || word_bounded(text, m.start(), m.end()) {
                return Some(m.range());
            }
            // retry one char past the rejected start
            from = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
        }
        None
    }

    /// Whether the byte span `[start, end)` of `text` is exactly one match.
    pub(crate) fn matches_span(&self, text: &str, start: usize, end: usize) -> bool {
        start < end && self.next_in(text, start) == Some(start..end)
    }
}

fn word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Half-open char range of one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub start: usize,
    pub end: usize,
}

impl SearchMatch {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
    pub fn len(&self) -> usize {
        self.end - self.start
    }
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
    /// Selection covering the match.
    pub fn selection(&self) -> Selection {
        Selection::new(self.start, self.end)
    }
}

/// Scan forward from char offset `from_pos` (no wraparound).
pub fn find_next(buffer: &Buffer, query: &SearchQuery, from_pos: usize) -> Option<SearchMatch> {
    let text = buffer.text();
    let from = buffer.char_to_byte(from_pos);
    let found = query.next_in(&text, from).map(|r| SearchMatch {
        start: buffer.byte_to_char(r.start),
        end: buffer.byte_to_char(r.end),
    });
    trace!(target: "search", from_pos, found = ?found, whole_word = query.whole_word, "find_next");
    found
}

/// Every non-overlapping match, left to right.
pub fn find_all(buffer: &Buffer, query: &SearchQuery) -> Vec<SearchMatch> {
    let text = buffer.text();
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(r) = query.next_in(&text, from) {
        from = r.end;
        out.push(SearchMatch {
            start: buffer.byte_to_char(r.start),
            end: buffer.byte_to_char(r.end),
        });
    }
    out
}

pub fn count_matches(buffer: &Buffer, query: &SearchQuery) -> usize {
    find_all(buffer, query).len()
}
