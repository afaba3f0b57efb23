//! Editor observability events and the sink they are delivered to.
//!
//! Every editing session owns an `Arc<dyn EventSink>` instead of writing to
//! process-global state. The binary installs `TracingEventSink`; tests install
//! `RecordingEventSink` and assert on the captured sequence.

use std::fmt;
use std::sync::Mutex;
use tracing::{debug, trace};

/// Which of the two history stacks an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackKind {
    Undo,
    Redo,
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackKind::Undo => f.write_str("undo"),
            StackKind::Redo => f.write_str("redo"),
        }
    }
}

/// Structured notification emitted at the session boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// A full-text change was observed but not yet committed.
    ChangePending { pending: usize },
    /// A checkpoint (snapshot) or delta was committed to the undo stack.
    Committed {
        seq: u64,
        undo_depth: usize,
        redo_depth: usize,
    },
    /// The oldest entry of a full stack was dropped.
    Evicted { stack: StackKind },
    /// Redo history discarded because a new edit branched the timeline.
    RedoCleared { discarded: usize },
    Undo { undo_depth: usize, redo_depth: usize },
    Redo { undo_depth: usize, redo_depth: usize },
    /// Undo/redo requested with nothing on the relevant stack.
    EmptyHistory { stack: StackKind },
    /// A delta could not be applied because the buffer no longer matches it.
    Diverged { pos: usize },
    /// A programmatic apply echoed back from the UI was swallowed.
    EchoSuppressed,
    SearchHit { start: usize, end: usize },
    SearchMiss { pattern_len: usize },
    Replaced { count: usize },
    InvalidPattern,
}

/// Receiver of `EditorEvent`s. Implementations must not block.
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, _event: &EditorEvent) {}
}

/// Default sink: drops everything.
pub struct NoopEventSink;

impl EventSink for NoopEventSink {}

/// Forwards events to `tracing` under the `editor.events` target.
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &EditorEvent) {
        match event {
            EditorEvent::ChangePending { .. } | EditorEvent::EchoSuppressed => {
                trace!(target: "editor.events", ?event, "event");
            }
            _ => debug!(target: "editor.events", ?event, "event"),
        }
    }
}

/// Captures events in memory, in emission order.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<EditorEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<EditorEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<EditorEvent> {
        match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn count_where(&self, pred: impl Fn(&EditorEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: &EditorEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
