//! Single and bulk replacement built on the literal matcher.
//!
//! Replacement text is inserted verbatim (`$1` stays `$1`).

use core_text::{Buffer, Selection};
use tracing::debug;

use crate::{SearchQuery, find_next};

/// Result of one "replace" step of the chained find/replace workflow.
#[derive(Debug, Clone)]
pub struct ReplaceOne {
    pub buffer: Buffer,
    /// Next match selected after the replacement (or the caret at the
    /// replacement end when there is none).
    pub selection: Selection,
    /// Whether the selection matched and was replaced.
    pub replaced: bool,
}

/// Replace the current selection if it is exactly one match of `query`, then
/// select the next match after it. A non-matching selection is left alone and
/// the next match after it is selected instead.
pub fn replace_one(
    buffer: &Buffer,
    query: &SearchQuery,
    replacement: &str,
    selection: Selection,
) -> ReplaceOne {
    let sel = selection.clamped(buffer.len_chars());
    let text = buffer.text();
    let start = buffer.char_to_byte(sel.start);
    let end = buffer.char_to_byte(sel.end);

    if !query.matches_span(&text, start, end) {
        let next = find_next(buffer, query, sel.end)
            .map(|m| m.selection())
            .unwrap_or(sel);
        return ReplaceOne {
            buffer: buffer.clone(),
            selection: next,
            replaced: false,
        };
    }

    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(replacement);
    out.push_str(&text[end..]);
    let replaced = Buffer::new(buffer.name.clone(), &out);
    let resume = sel.start + replacement.chars().count();
    let next = find_next(&replaced, query, resume)
        .map(|m| m.selection())
        .unwrap_or(Selection::caret(resume));
    debug!(target: "search", pos = sel.start, next = ?next, "replace_one");
    ReplaceOne {
        buffer: replaced,
        selection: next,
        replaced: true,
    }
}

/// Replace every non-overlapping match, left to right. Returns the new buffer
/// and the number of substitutions (zero is a normal outcome).
pub fn replace_all(buffer: &Buffer, query: &SearchQuery, replacement: &str) -> (Buffer, usize) {
    let text = buffer.text();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut count = 0;
    while let Some(r) = query.next_in(&text, last) {
        out.push_str(&text[last..r.start]);
        out.push_str(replacement);
        last = r.end;
        count += 1;
    }
    out.push_str(&text[last..]);
    debug!(target: "search", count, pattern_len = query.pattern().len(), "replace_all");
    (Buffer::new(buffer.name.clone(), &out), count)
}
