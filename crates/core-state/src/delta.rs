//! Positional history: a bounded log of invertible insert/delete deltas.
//!
//! The log never stores full text, so offsets are only meaningful against the
//! buffer the ops were recorded from. Every mutation of that buffer must pass
//! through the recorder (`DeltaLog::record`); an out-of-band edit invalidates
//! the stored positions. `EditOp::apply` checks removed text before mutating
//! and reports `HistoryError::Diverged` instead of corrupting the buffer.

use core_events::StackKind;
use core_text::Buffer;
use std::ops::Range;
use tracing::trace;

use crate::HistoryError;
use crate::bounded::BoundedStack;
use crate::undo::HISTORY_CAPACITY;

/// A minimal, invertible positional edit. Positions and lengths are in chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Insert { pos: usize, text: String },
    Delete { pos: usize, text: String },
    /// Atomic delete + insert at one position (find/replace results).
    Replace {
        pos: usize,
        removed: String,
        inserted: String,
    },
}

impl EditOp {
    pub fn insert(pos: usize, text: impl Into<String>) -> Self {
        EditOp::Insert {
            pos,
            text: text.into(),
        }
    }

    pub fn delete(pos: usize, text: impl Into<String>) -> Self {
        EditOp::Delete {
            pos,
            text: text.into(),
        }
    }

    pub fn replace(pos: usize, removed: impl Into<String>, inserted: impl Into<String>) -> Self {
        EditOp::Replace {
            pos,
            removed: removed.into(),
            inserted: inserted.into(),
        }
    }

    pub fn pos(&self) -> usize {
        match self {
            EditOp::Insert { pos, .. } | EditOp::Delete { pos, .. } | EditOp::Replace { pos, .. } => {
                *pos
            }
        }
    }

    /// Text this op removes from the buffer.
    pub fn removed(&self) -> &str {
        match self {
            EditOp::Insert { .. } => "",
            EditOp::Delete { text, .. } => text,
            EditOp::Replace { removed, .. } => removed,
        }
    }

    /// Text this op adds to the buffer.
    pub fn inserted(&self) -> &str {
        match self {
            EditOp::Insert { text, .. } => text,
            EditOp::Delete { .. } => "",
            EditOp::Replace { inserted, .. } => inserted,
        }
    }

    /// Char range this op replaces in the pre-op buffer.
    pub fn target(&self) -> Range<usize> {
        let pos = self.pos();
        pos..pos + self.removed().chars().count()
    }

    /// Char offset just past the inserted text once applied.
    pub fn end_after(&self) -> usize {
        self.pos() + self.inserted().chars().count()
    }

    pub fn is_noop(&self) -> bool {
        self.removed() == self.inserted()
    }

    /// The op that undoes this one.
    pub fn inverse(&self) -> EditOp {
        match self {
            EditOp::Insert { pos, text } => EditOp::delete(*pos, text.clone()),
            EditOp::Delete { pos, text } => EditOp::insert(*pos, text.clone()),
            EditOp::Replace {
                pos,
                removed,
                inserted,
            } => EditOp::replace(*pos, inserted.clone(), removed.clone()),
        }
    }

    /// Apply to `buffer`. Removed text must match the buffer exactly; on
    /// mismatch the buffer is left untouched.
    pub fn apply(&self, buffer: &mut Buffer) -> Result<(), HistoryError> {
        let target = self.target();
        if !target.is_empty() {
            let found = buffer.slice(target.clone())?;
            if found != self.removed() {
                return Err(HistoryError::Diverged {
                    pos: self.pos(),
                    expected: self.removed().to_owned(),
                    found,
                });
            }
        }
        buffer.splice(target, self.inserted())?;
        Ok(())
    }

    /// Smallest single op turning `old` into `new` (common prefix/suffix
    /// trimmed). `None` when the texts are equal.
    pub fn diff(old: &str, new: &str) -> Option<EditOp> {
        if old == new {
            return None;
        }
        let old_chars: Vec<char> = old.chars().collect();
        let new_chars: Vec<char> = new.chars().collect();
        let prefix = old_chars
            .iter()
            .zip(&new_chars)
            .take_while(|(a, b)| a == b)
            .count();
        let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
        let suffix = old_chars
            .iter()
            .rev()
            .zip(new_chars.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        let removed: String = old_chars[prefix..old_chars.len() - suffix].iter().collect();
        let inserted: String = new_chars[prefix..new_chars.len() - suffix].iter().collect();
        Some(match (removed.is_empty(), inserted.is_empty()) {
            (true, _) => EditOp::insert(prefix, inserted),
            (_, true) => EditOp::delete(prefix, removed),
            _ => EditOp::replace(prefix, removed, inserted),
        })
    }

    fn kind(&self) -> &'static str {
        match self {
            EditOp::Insert { .. } => "insert",
            EditOp::Delete { .. } => "delete",
            EditOp::Replace { .. } => "replace",
        }
    }
}

/// What `DeltaLog::record` displaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    pub evicted: bool,
    pub redo_cleared: usize,
}

pub struct DeltaLog {
    undo_log: BoundedStack<EditOp>,
    redo_log: BoundedStack<EditOp>,
    undo_evictions: u64,
    redo_evictions: u64,
}

impl Default for DeltaLog {
    fn default() -> Self {
        Self::new()
    }
}

impl DeltaLog {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo_log: BoundedStack::new(capacity),
            redo_log: BoundedStack::new(capacity),
            undo_evictions: 0,
            redo_evictions: 0,
        }
    }

    /// Append an op that has just been applied to the buffer.
    pub fn record(&mut self, op: EditOp) -> RecordOutcome {
        trace!(target: "state.delta", kind = op.kind(), pos = op.pos(), removed = op.removed().len(), inserted = op.inserted().len(), "record");
        let evicted = self.undo_log.push(op).is_some();
        if evicted {
            self.undo_evictions += 1;
            trace!(target: "state.delta", "undo_log_trimmed");
        }
        let redo_cleared = self.redo_log.clear();
        if redo_cleared > 0 {
            trace!(target: "state.delta", redo_cleared, "redo_log_cleared_on_new_edit");
        }
        RecordOutcome {
            evicted,
            redo_cleared,
        }
    }

    /// Pop the newest op and return its inverse for the caller to apply.
    pub fn undo(&mut self) -> Option<EditOp> {
        let op = self.undo_log.pop()?;
        let inverse = op.inverse();
        if self.redo_log.push(op).is_some() {
            self.redo_evictions += 1;
        }
        trace!(target: "state.delta", undo_depth = self.undo_log.len(), redo_depth = self.redo_log.len(), "undo_pop");
        Some(inverse)
    }

    /// Pop the newest undone op and return it (not inverted) for re-application.
    pub fn redo(&mut self) -> Option<EditOp> {
        let op = self.redo_log.pop()?;
        let replay = op.clone();
        if self.undo_log.push(op).is_some() {
            self.undo_evictions += 1;
        }
        trace!(target: "state.delta", undo_depth = self.undo_log.len(), redo_depth = self.redo_log.len(), "redo_pop");
        Some(replay)
    }

    /// Move the op handed out by the last `undo` back onto the undo log, for
    /// when its inverse could not be applied.
    pub(crate) fn requeue_undone(&mut self) {
        if let Some(op) = self.redo_log.pop() {
            self.undo_log.push(op);
        }
    }

    /// Move the op handed out by the last `redo` back onto the redo log, for
    /// when it could not be applied.
    pub(crate) fn requeue_redone(&mut self) {
        if let Some(op) = self.undo_log.pop() {
            self.redo_log.push(op);
        }
    }

    /// Number of ops currently undoable (the position in the linear timeline).
    pub fn position(&self) -> usize {
        self.undo_log.len()
    }
    pub fn undo_depth(&self) -> usize {
        self.undo_log.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo_log.len()
    }
    pub fn can_undo(&self) -> bool {
        !self.undo_log.is_empty()
    }
    pub fn can_redo(&self) -> bool {
        !self.redo_log.is_empty()
    }
    pub fn evictions(&self, stack: StackKind) -> u64 {
        match stack {
            StackKind::Undo => self.undo_evictions,
            StackKind::Redo => self.redo_evictions,
        }
    }
    pub fn clear(&mut self) {
        self.undo_log.clear();
        self.redo_log.clear();
    }
}
