//! Document file IO.
//!
//! Buffers are LF-only internally. The dominant line ending of a file is
//! remembered on read and restored on write.

use anyhow::{Context, Result};
use core_text::Buffer;
use std::borrow::Cow;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
    Cr,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }
}

#[derive(Debug)]
pub struct NormalizedText {
    pub normalized: String,
    pub original: LineEnding,
    /// More than one ending style was present.
    pub mixed: bool,
}

/// Rewrite CRLF and lone CR to LF. The majority style wins
/// (ties: CRLF > LF > CR).
pub fn normalize_line_endings(input: &str) -> NormalizedText {
    let (mut crlf, mut lf, mut cr) = (0usize, 0usize, 0usize);
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                crlf += 1;
                out.push('\n');
            }
            '\r' => {
                cr += 1;
                out.push('\n');
            }
            '\n' => {
                lf += 1;
                out.push('\n');
            }
            c => out.push(c),
        }
    }
    let mut original = LineEnding::Lf;
    let mut max = 0;
    for (style, count) in [
        (LineEnding::Crlf, crlf),
        (LineEnding::Lf, lf),
        (LineEnding::Cr, cr),
    ] {
        if count > max {
            max = count;
            original = style;
        }
    }
    let mixed = [crlf, lf, cr].iter().filter(|n| **n > 0).count() > 1;
    NormalizedText {
        normalized: out,
        original,
        mixed,
    }
}

/// Convert LF-only text back to `ending`.
pub fn restore_line_endings(text: &str, ending: LineEnding) -> Cow<'_, str> {
    match ending {
        LineEnding::Lf => Cow::Borrowed(text),
        other => Cow::Owned(text.replace('\n', other.as_str())),
    }
}

#[derive(Debug)]
pub struct Document {
    pub buffer: Buffer,
    pub line_ending: LineEnding,
    pub mixed_line_endings: bool,
}

pub fn open_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let norm = normalize_line_endings(&content);
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("file");
    tracing::debug!(
        target: "io",
        file = %path.display(),
        size_bytes = content.len(),
        line_ending = ?norm.original,
        mixed = norm.mixed,
        "file_read_ok"
    );
    Ok(Document {
        buffer: Buffer::new(name, &norm.normalized),
        line_ending: norm.original,
        mixed_line_endings: norm.mixed,
    })
}

pub fn write_document(path: &Path, text: &str, ending: LineEnding) -> Result<()> {
    let out = restore_line_endings(text, ending);
    std::fs::write(path, out.as_bytes()).with_context(|| format!("writing {}", path.display()))?;
    tracing::debug!(target: "io", file = %path.display(), size_bytes = out.len(), "file_write_ok");
    Ok(())
}
