//! Editing session state: document buffer, selection and undo history for one tab.
//!
//! History strategies:
//! - `Delta` (default) records one `EditOp` per mutation in a bounded
//!   `DeltaLog`. Full-text notifications are reduced to a single op by a
//!   prefix/suffix diff, so both notification styles feed the same log.
//! - `Snapshot` feeds every observed text into a coalescing `HistoryStack`.
//!   Pending (uncommitted) changes are flushed into a checkpoint before an undo
//!   so the newest typing is what gets undone first. Redo flushes the same
//!   way; that flush is a commit, so typing after an undo discards the redo
//!   branch instead of being overwritten by it.
//!
//! The strategy is fixed when the session is created.
//!
//! Apply / echo protocol:
//! - `undo`, `redo` and `apply_edit` mutate the session buffer and return an
//!   `Apply` for the UI to render. With echo suppression enabled the session
//!   then ignores exactly one following change notification, which is the
//!   UI's own report of that programmatic apply. A UI that does not echo
//!   must call `acknowledge_apply` after rendering.
//!
//! Preconditions (not enforced): single-threaded access, and every buffer
//! mutation reaches the session either as a notification or via `apply_edit`.

use core_events::{EditorEvent, EventSink, NoopEventSink, StackKind};
use core_text::{Buffer, BufferError, Selection};
use std::sync::Arc;
use thiserror::Error;
use tracing::{trace, warn};

pub mod bounded;
pub mod delta;
pub mod undo;

pub use delta::{DeltaLog, EditOp, RecordOutcome};
pub use undo::{
    COALESCE_THRESHOLD, ChangeCoalescer, Checkpoint, CoalesceDecision, HISTORY_CAPACITY,
    HistoryStack, PushOutcome,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// A recorded delta no longer matches the buffer (out-of-band mutation).
    #[error("delta at {pos} expected {expected:?} but buffer holds {found:?}")]
    Diverged {
        pos: usize,
        expected: String,
        found: String,
    },
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Content the UI must render after a programmatic change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Apply {
    /// Replace the whole visible text.
    Replace(String),
    /// Replace the char range `[start, end)` with `text`.
    Splice {
        start: usize,
        end: usize,
        text: String,
    },
}

impl Apply {
    fn from_op(op: &EditOp) -> Self {
        let target = op.target();
        Apply::Splice {
            start: target.start,
            end: target.end,
            text: op.inserted().to_owned(),
        }
    }

    /// Apply to a UI-side buffer mirror.
    pub fn apply_to(&self, buffer: &mut Buffer) -> Result<(), BufferError> {
        match self {
            Apply::Replace(text) => {
                buffer.set_text(text);
                Ok(())
            }
            Apply::Splice { start, end, text } => buffer.splice(*start..*end, text).map(|_| ()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryStrategy {
    #[default]
    Delta,
    Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub strategy: HistoryStrategy,
    pub capacity: usize,
    pub coalesce_threshold: usize,
    pub suppress_echo: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            strategy: HistoryStrategy::Delta,
            capacity: HISTORY_CAPACITY,
            coalesce_threshold: COALESCE_THRESHOLD,
            suppress_echo: true,
        }
    }
}

enum History {
    Delta(DeltaLog),
    Snapshot(HistoryStack),
}

pub struct EditorSession {
    buffer: Buffer,
    selection: Selection,
    history: History,
    ignore_next_change: bool,
    suppress_echo: bool,
    sink: Arc<dyn EventSink>,
    /// Monotonic count of delta commits (snapshot strategy numbers checkpoints itself).
    delta_seq: u64,
}

impl EditorSession {
    pub fn new(buffer: Buffer, options: SessionOptions) -> Self {
        let history = match options.strategy {
            HistoryStrategy::Delta => History::Delta(DeltaLog::with_capacity(options.capacity)),
            HistoryStrategy::Snapshot => History::Snapshot(HistoryStack::with_limits(
                &buffer.text(),
                options.capacity,
                options.coalesce_threshold,
            )),
        };
        Self {
            buffer,
            selection: Selection::default(),
            history,
            ignore_next_change: false,
            suppress_echo: options.suppress_echo,
            sink: Arc::new(NoopEventSink),
            delta_seq: 0,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }
    pub fn text(&self) -> String {
        self.buffer.text()
    }
    pub fn selection(&self) -> Selection {
        self.selection
    }
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamped(self.buffer.len_chars());
    }
    pub fn selected_text(&self) -> String {
        self.buffer
            .slice(self.selection.range())
            .unwrap_or_default()
    }
    pub fn emit(&self, event: EditorEvent) {
        self.sink.emit(&event);
    }

    pub fn strategy(&self) -> HistoryStrategy {
        match self.history {
            History::Delta(_) => HistoryStrategy::Delta,
            History::Snapshot(_) => HistoryStrategy::Snapshot,
        }
    }
    pub fn undo_depth(&self) -> usize {
        match &self.history {
            History::Delta(log) => log.undo_depth(),
            History::Snapshot(h) => h.undo_depth(),
        }
    }
    pub fn redo_depth(&self) -> usize {
        match &self.history {
            History::Delta(log) => log.redo_depth(),
            History::Snapshot(h) => h.redo_depth(),
        }
    }
    /// Whether `undo` would change anything (counts an unflushed snapshot tail).
    pub fn can_undo(&self) -> bool {
        match &self.history {
            History::Delta(log) => log.can_undo(),
            History::Snapshot(h) => h.can_undo() || h.has_uncommitted(),
        }
    }
    /// Whether `redo` would change anything (an unflushed snapshot tail
    /// discards the redo branch).
    pub fn can_redo(&self) -> bool {
        match &self.history {
            History::Delta(log) => log.can_redo(),
            History::Snapshot(h) => h.can_redo() && !h.has_uncommitted(),
        }
    }
    /// Uncommitted change count (always 0 for the delta strategy).
    pub fn pending_changes(&self) -> usize {
        match &self.history {
            History::Delta(_) => 0,
            History::Snapshot(h) => h.pending_changes(),
        }
    }
    pub fn is_ignoring_next_change(&self) -> bool {
        self.ignore_next_change
    }
    /// The UI rendered an `Apply` without echoing a change notification.
    pub fn acknowledge_apply(&mut self) {
        self.ignore_next_change = false;
    }

    /// Full buffer text reported by the UI after a user edit.
    pub fn on_text_changed(&mut self, full_text: &str) -> Result<(), HistoryError> {
        if self.take_echo() {
            return Ok(());
        }
        match &mut self.history {
            History::Snapshot(h) => {
                self.buffer.set_text(full_text);
                let outcome = h.push(full_text);
                report_push(self.sink.as_ref(), outcome, h.undo_depth(), h.redo_depth());
            }
            History::Delta(_) => {
                let Some(op) = EditOp::diff(&self.buffer.text(), full_text) else {
                    return Ok(());
                };
                self.buffer.set_text(full_text);
                self.record(op);
            }
        }
        self.set_selection(self.selection);
        Ok(())
    }

    /// Positional edit reported by the UI. The op describes the change
    /// against the session buffer as it was before the edit.
    pub fn on_edit_op(&mut self, op: EditOp) -> Result<(), HistoryError> {
        if self.take_echo() || op.is_noop() {
            return Ok(());
        }
        op.apply(&mut self.buffer)?;
        self.selection = Selection::caret(op.end_after());
        match &mut self.history {
            History::Delta(_) => self.record(op),
            History::Snapshot(h) => {
                let outcome = h.push(&self.buffer.text());
                report_push(self.sink.as_ref(), outcome, h.undo_depth(), h.redo_depth());
            }
        }
        Ok(())
    }

    /// Programmatic edit (find/replace): replace the whole text with
    /// `new_text`, record it like any user edit and hand back what the UI
    /// must render. `None` when the text did not change.
    pub fn apply_edit(
        &mut self,
        new_text: &str,
        selection: Selection,
    ) -> Result<Option<Apply>, HistoryError> {
        let Some(op) = EditOp::diff(&self.buffer.text(), new_text) else {
            self.set_selection(selection);
            return Ok(None);
        };
        op.apply(&mut self.buffer)?;
        match &mut self.history {
            History::Delta(_) => self.record(op.clone()),
            History::Snapshot(h) => {
                let outcome = h.push(new_text);
                report_push(self.sink.as_ref(), outcome, h.undo_depth(), h.redo_depth());
            }
        }
        self.set_selection(selection);
        self.arm_echo();
        Ok(Some(Apply::from_op(&op)))
    }

    /// Undo one step. `Ok(None)` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<Option<Apply>, HistoryError> {
        let apply = match &mut self.history {
            History::Snapshot(h) => {
                if let Some(outcome) = h.flush() {
                    report_push(self.sink.as_ref(), outcome, h.undo_depth(), h.redo_depth());
                }
                let Some(text) = h.undo().map(str::to_owned) else {
                    self.sink.emit(&EditorEvent::EmptyHistory {
                        stack: StackKind::Undo,
                    });
                    return Ok(None);
                };
                self.buffer.set_text(&text);
                self.sink.emit(&EditorEvent::Undo {
                    undo_depth: h.undo_depth(),
                    redo_depth: h.redo_depth(),
                });
                Apply::Replace(text)
            }
            History::Delta(log) => {
                let Some(inverse) = log.undo() else {
                    self.sink.emit(&EditorEvent::EmptyHistory {
                        stack: StackKind::Undo,
                    });
                    return Ok(None);
                };
                if let Err(e) = inverse.apply(&mut self.buffer) {
                    log.requeue_undone();
                    warn!(target: "state.session", pos = inverse.pos(), error = %e, "undo_diverged");
                    self.sink.emit(&EditorEvent::Diverged { pos: inverse.pos() });
                    return Err(e);
                }
                self.selection = Selection::caret(inverse.end_after());
                self.sink.emit(&EditorEvent::Undo {
                    undo_depth: log.undo_depth(),
                    redo_depth: log.redo_depth(),
                });
                Apply::from_op(&inverse)
            }
        };
        self.set_selection(self.selection);
        self.arm_echo();
        Ok(Some(apply))
    }

    /// Redo one step. `Ok(None)` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<Option<Apply>, HistoryError> {
        let apply = match &mut self.history {
            History::Snapshot(h) => {
                if let Some(outcome) = h.flush() {
                    report_push(self.sink.as_ref(), outcome, h.undo_depth(), h.redo_depth());
                }
                let Some(text) = h.redo().map(str::to_owned) else {
                    self.sink.emit(&EditorEvent::EmptyHistory {
                        stack: StackKind::Redo,
                    });
                    return Ok(None);
                };
                self.buffer.set_text(&text);
                self.sink.emit(&EditorEvent::Redo {
                    undo_depth: h.undo_depth(),
                    redo_depth: h.redo_depth(),
                });
                Apply::Replace(text)
            }
            History::Delta(log) => {
                let Some(op) = log.redo() else {
                    self.sink.emit(&EditorEvent::EmptyHistory {
                        stack: StackKind::Redo,
                    });
                    return Ok(None);
                };
                if let Err(e) = op.apply(&mut self.buffer) {
                    log.requeue_redone();
                    warn!(target: "state.session", pos = op.pos(), error = %e, "redo_diverged");
                    self.sink.emit(&EditorEvent::Diverged { pos: op.pos() });
                    return Err(e);
                }
                self.selection = Selection::caret(op.end_after());
                self.sink.emit(&EditorEvent::Redo {
                    undo_depth: log.undo_depth(),
                    redo_depth: log.redo_depth(),
                });
                Apply::from_op(&op)
            }
        };
        self.set_selection(self.selection);
        self.arm_echo();
        Ok(Some(apply))
    }

    fn record(&mut self, op: EditOp) {
        let History::Delta(log) = &mut self.history else {
            return;
        };
        let outcome = log.record(op);
        self.delta_seq += 1;
        if outcome.evicted {
            self.sink.emit(&EditorEvent::Evicted {
                stack: StackKind::Undo,
            });
        }
        if outcome.redo_cleared > 0 {
            self.sink.emit(&EditorEvent::RedoCleared {
                discarded: outcome.redo_cleared,
            });
        }
        self.sink.emit(&EditorEvent::Committed {
            seq: self.delta_seq,
            undo_depth: log.undo_depth(),
            redo_depth: log.redo_depth(),
        });
    }

    fn arm_echo(&mut self) {
        if self.suppress_echo {
            self.ignore_next_change = true;
        }
    }

    fn take_echo(&mut self) -> bool {
        if !self.ignore_next_change {
            return false;
        }
        self.ignore_next_change = false;
        trace!(target: "state.session", "echo_suppressed");
        self.sink.emit(&EditorEvent::EchoSuppressed);
        true
    }
}

fn report_push(sink: &dyn EventSink, outcome: PushOutcome, undo_depth: usize, redo_depth: usize) {
    match outcome {
        PushOutcome::Unchanged => {}
        PushOutcome::Pending(pending) => sink.emit(&EditorEvent::ChangePending { pending }),
        PushOutcome::Committed {
            seq,
            evicted,
            redo_cleared,
        } => {
            if evicted {
                sink.emit(&EditorEvent::Evicted {
                    stack: StackKind::Undo,
                });
            }
            if redo_cleared > 0 {
                sink.emit(&EditorEvent::RedoCleared {
                    discarded: redo_cleared,
                });
            }
            sink.emit(&EditorEvent::Committed {
                seq,
                undo_depth,
                redo_depth,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::RecordingEventSink;

    fn session(strategy: HistoryStrategy, text: &str) -> EditorSession {
        EditorSession::new(
            Buffer::new("t", text),
            SessionOptions {
                strategy,
                suppress_echo: false,
                ..SessionOptions::default()
            },
        )
    }

    #[test]
    fn delta_text_notifications_undo_in_order() {
        let mut s = session(HistoryStrategy::Delta, "");
        s.on_text_changed("Initial").unwrap();
        s.on_text_changed("Initial text").unwrap();
        assert_eq!(s.undo_depth(), 2);

        let apply = s.undo().unwrap().unwrap();
        assert_eq!(
            apply,
            Apply::Splice {
                start: 7,
                end: 12,
                text: String::new()
            }
        );
        assert_eq!(s.text(), "Initial");
        s.redo().unwrap();
        assert_eq!(s.text(), "Initial text");
    }

    #[test]
    fn snapshot_undo_flushes_pending_tail() {
        let mut s = session(HistoryStrategy::Snapshot, "");
        s.on_text_changed("Initial").unwrap();
        s.on_text_changed("Initial text").unwrap();
        assert_eq!(s.pending_changes(), 2);
        assert!(s.can_undo());

        let apply = s.undo().unwrap().unwrap();
        assert_eq!(apply, Apply::Replace(String::new()));
        assert_eq!(s.text(), "");
        s.redo().unwrap();
        assert_eq!(s.text(), "Initial text");
    }

    #[test]
    fn snapshot_redo_keeps_typing_after_undo() {
        let mut s = session(HistoryStrategy::Snapshot, "");
        for t in ["a", "ab", "abc", "abcd", "abcde"] {
            s.on_text_changed(t).unwrap();
        }
        s.undo().unwrap();
        assert_eq!(s.text(), "");
        assert!(s.can_redo());

        s.on_text_changed("X").unwrap();
        assert_eq!(s.pending_changes(), 1);
        assert!(!s.can_redo());
        assert_eq!(s.redo().unwrap(), None);
        assert_eq!(s.text(), "X");
        assert_eq!(s.redo_depth(), 0);

        // the typed text is its own checkpoint now
        s.undo().unwrap();
        assert_eq!(s.text(), "");
        s.redo().unwrap();
        assert_eq!(s.text(), "X");
    }

    #[test]
    fn empty_history_leaves_buffer_untouched() {
        for strategy in [HistoryStrategy::Delta, HistoryStrategy::Snapshot] {
            let sink = Arc::new(RecordingEventSink::new());
            let mut s = session(strategy, "keep").with_sink(sink.clone());
            assert_eq!(s.undo().unwrap(), None);
            assert_eq!(s.redo().unwrap(), None);
            assert_eq!(s.text(), "keep");
            assert_eq!(
                sink.events(),
                vec![
                    EditorEvent::EmptyHistory {
                        stack: StackKind::Undo
                    },
                    EditorEvent::EmptyHistory {
                        stack: StackKind::Redo
                    }
                ]
            );
        }
    }

    #[test]
    fn echo_after_undo_is_ignored_once() {
        let mut s = EditorSession::new(Buffer::new("t", "ab"), SessionOptions::default());
        s.on_edit_op(EditOp::insert(2, "c")).unwrap();
        let apply = s.undo().unwrap().unwrap();
        assert!(s.is_ignoring_next_change());

        // UI renders the restore and echoes the resulting text.
        let mut ui = Buffer::new("ui", "abc");
        apply.apply_to(&mut ui).unwrap();
        s.on_text_changed(&ui.text()).unwrap();
        assert!(!s.is_ignoring_next_change());
        assert_eq!(s.redo_depth(), 1, "echo must not clear redo");

        s.on_text_changed("abX").unwrap();
        assert_eq!(s.redo_depth(), 0);
    }

    #[test]
    fn acknowledge_apply_clears_flag() {
        let mut s = EditorSession::new(Buffer::new("t", ""), SessionOptions::default());
        s.on_edit_op(EditOp::insert(0, "x")).unwrap();
        s.undo().unwrap();
        s.acknowledge_apply();
        s.on_edit_op(EditOp::insert(0, "y")).unwrap();
        assert_eq!(s.text(), "y");
    }

    #[test]
    fn diverged_undo_keeps_log_position() {
        let sink = Arc::new(RecordingEventSink::new());
        let mut s = session(HistoryStrategy::Delta, "abc").with_sink(sink.clone());
        s.on_edit_op(EditOp::insert(3, "def")).unwrap();
        // out-of-band mutation bypassing the recorder
        s.buffer.set_text("zzz");
        let err = s.undo().unwrap_err();
        assert!(matches!(err, HistoryError::Diverged { pos: 3, .. }));
        assert_eq!(s.text(), "zzz");
        assert_eq!(s.undo_depth(), 1);
        assert_eq!(s.redo_depth(), 0);
        assert!(sink.events().contains(&EditorEvent::Diverged { pos: 3 }));
    }

    #[test]
    fn on_edit_op_rejects_mismatched_delete() {
        let mut s = session(HistoryStrategy::Delta, "hello");
        let err = s.on_edit_op(EditOp::delete(0, "world")).unwrap_err();
        assert!(matches!(err, HistoryError::Diverged { .. }));
        assert_eq!(s.undo_depth(), 0);
        assert_eq!(s.text(), "hello");
    }

    #[test]
    fn apply_edit_records_single_step() {
        let sink = Arc::new(RecordingEventSink::new());
        let mut s = session(HistoryStrategy::Delta, "find this text").with_sink(sink.clone());
        let apply = s
            .apply_edit("find that text", Selection::new(5, 9))
            .unwrap()
            .unwrap();
        assert_eq!(
            apply,
            Apply::Splice {
                start: 7,
                end: 9,
                text: "at".into()
            }
        );
        assert_eq!(s.selected_text(), "that");
        assert_eq!(s.undo_depth(), 1);
        assert!(sink.events().contains(&EditorEvent::Committed {
            seq: 1,
            undo_depth: 1,
            redo_depth: 0
        }));
        s.undo().unwrap();
        assert_eq!(s.text(), "find this text");
    }

    #[test]
    fn apply_edit_without_change_only_moves_selection() {
        let mut s = session(HistoryStrategy::Delta, "same");
        assert_eq!(s.apply_edit("same", Selection::new(0, 2)).unwrap(), None);
        assert_eq!(s.selection(), Selection::new(0, 2));
        assert!(!s.is_ignoring_next_change());
    }

    #[test]
    fn selection_is_clamped_after_undo() {
        let mut s = session(HistoryStrategy::Snapshot, "");
        for t in ["a", "ab", "abc", "abcd", "abcde"] {
            s.on_text_changed(t).unwrap();
        }
        s.set_selection(Selection::new(1, 5));
        s.undo().unwrap();
        assert_eq!(s.text(), "");
        assert_eq!(s.selection(), Selection::caret(0));
    }
}
