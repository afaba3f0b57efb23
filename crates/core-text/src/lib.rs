//! Rope-based document text for one editing session.
//!
//! All public offsets are *char* offsets (Unicode scalar values), matching the
//! positions a toolkit text control reports for insert/delete notifications.
//! Byte offsets only appear at the regex boundary (`char_to_byte` /
//! `byte_to_char`) and never leak into history records.

use ropey::Rope;
use std::ops::Range;
use thiserror::Error;

/// Errors raised when a positional edit does not fit the current text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("position {pos} is past the end of the buffer (len {len})")]
    OutOfRange { pos: usize, len: usize },
    #[error("range start {start} is after range end {end}")]
    InvertedRange { start: usize, end: usize },
}

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.name)
            .field("len_chars", &self.rope.len_chars())
            .finish()
    }
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn new(name: impl Into<String>, content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
            name: name.into(),
        }
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Full text as an owned string.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Text in the char range `[start, end)`.
    pub fn slice(&self, range: Range<usize>) -> Result<String, BufferError> {
        self.check_range(&range)?;
        Ok(self.rope.slice(range).to_string())
    }

    /// Insert `text` at char offset `pos`.
    pub fn insert(&mut self, pos: usize, text: &str) -> Result<(), BufferError> {
        let len = self.rope.len_chars();
        if pos > len {
            return Err(BufferError::OutOfRange { pos, len });
        }
        self.rope.insert(pos, text);
        Ok(())
    }

    /// Remove the char range `[start, end)`, returning the removed text.
    pub fn remove(&mut self, range: Range<usize>) -> Result<String, BufferError> {
        self.check_range(&range)?;
        if range.is_empty() {
            return Ok(String::new());
        }
        let removed = self.rope.slice(range.clone()).to_string();
        self.rope.remove(range);
        Ok(removed)
    }

    /// Replace `[start, end)` with `text` in one step.
    pub fn splice(&mut self, range: Range<usize>, text: &str) -> Result<String, BufferError> {
        let start = range.start;
        let removed = self.remove(range)?;
        self.rope.insert(start, text);
        Ok(removed)
    }

    /// Replace the whole content (programmatic restore / full-text notification).
    pub fn set_text(&mut self, content: &str) {
        self.rope = Rope::from_str(content);
    }

    /// Byte offset of char index `idx` (clamped to the end).
    pub fn char_to_byte(&self, idx: usize) -> usize {
        self.rope.char_to_byte(idx.min(self.rope.len_chars()))
    }

    /// Char index containing byte offset `byte` (clamped to the end).
    pub fn byte_to_char(&self, byte: usize) -> usize {
        self.rope.byte_to_char(byte.min(self.rope.len_bytes()))
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), BufferError> {
        let len = self.rope.len_chars();
        if range.start > range.end {
            return Err(BufferError::InvertedRange {
                start: range.start,
                end: range.end,
            });
        }
        if range.end > len {
            return Err(BufferError::OutOfRange {
                pos: range.end,
                len,
            });
        }
        Ok(())
    }
}

/// Half-open char range `[start, end)` of the active selection. An empty
/// selection is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    /// Construct a selection normalizing ordering so that start <= end.
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn caret(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Clamp both ends into a buffer of `len` chars.
    pub fn clamped(self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

/// Word classification used by whole-word search: alphanumeric or underscore.
pub fn is_word_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn length_counts_chars() {
        let b = Buffer::new("test", "héllo\nworld");
        assert_eq!(b.text(), "héllo\nworld");
        assert_eq!(b.len_chars(), 11);
        assert!(!b.is_empty());
        assert!(Buffer::new("empty", "").is_empty());
    }

    #[test]
    fn insert_and_remove_use_char_offsets() {
        let mut b = Buffer::new("t", "héllo");
        b.insert(2, "XY").unwrap();
        assert_eq!(b.text(), "héXYllo");
        let removed = b.remove(1..4).unwrap();
        assert_eq!(removed, "éXY");
        assert_eq!(b.text(), "hllo");
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let mut b = Buffer::new("t", "abc");
        assert_eq!(
            b.insert(4, "x"),
            Err(BufferError::OutOfRange { pos: 4, len: 3 })
        );
        assert_eq!(b.text(), "abc");
    }

    #[test]
    fn inverted_range_is_rejected() {
        let b = Buffer::new("t", "abc");
        assert_eq!(
            b.slice(2..1),
            Err(BufferError::InvertedRange { start: 2, end: 1 })
        );
    }

    #[test]
    fn splice_replaces_range() {
        let mut b = Buffer::new("t", "find this text");
        let removed = b.splice(5..9, "that").unwrap();
        assert_eq!(removed, "this");
        assert_eq!(b.text(), "find that text");
    }

    #[test]
    fn byte_char_conversion_round_trips_on_boundaries() {
        let b = Buffer::new("t", "aé😀b");
        assert_eq!(b.char_to_byte(2), 3);
        assert_eq!(b.byte_to_char(3), 2);
        assert_eq!(b.char_to_byte(3), 7);
        assert_eq!(b.char_to_byte(99), b.text().len());
    }

    #[test]
    fn selection_normalizes_and_clamps() {
        let s = Selection::new(7, 2);
        assert_eq!(s, Selection { start: 2, end: 7 });
        assert_eq!(s.len(), 5);
        assert_eq!(s.clamped(4), Selection { start: 2, end: 4 });
        assert!(Selection::caret(3).is_empty());
    }

    #[test]
    fn word_chars() {
        assert!(is_word_char('a'));
        assert!(is_word_char('_'));
        assert!(is_word_char('é'));
        assert!(!is_word_char(' '));
        assert!(!is_word_char('-'));
    }
}
