//! Snapshot history: coalesced full-text checkpoints on two bounded stacks.
//!
//! Every observed buffer text is fed to `HistoryStack::push`. The
//! `ChangeCoalescer` counts texts that differ from the committed checkpoint and
//! only commits on the threshold-th one, so a burst of keystrokes becomes one
//! undo step. Texts equal to the committed checkpoint are ignored entirely
//! (focus churn, programmatic echoes).
//!
//! Undo after an eviction cannot reach past the oldest retained checkpoint;
//! that loss is accepted, not an error.

use core_events::StackKind;
use tracing::trace;

use crate::bounded::BoundedStack;

/// Maximum number of entries retained on each history stack.
pub const HISTORY_CAPACITY: usize = 64;
/// Number of differing observations that commit one checkpoint.
pub const COALESCE_THRESHOLD: usize = 5;

/// Immutable full-text snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub seq: u64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalesceDecision {
    /// Observed text equals the committed checkpoint.
    Unchanged,
    /// Counted but below threshold; carries the pending count.
    Pending(usize),
    /// Threshold reached; counter already reset.
    Commit,
}

#[derive(Debug, Clone)]
pub struct ChangeCoalescer {
    threshold: usize,
    pending: usize,
}

impl ChangeCoalescer {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            pending: 0,
        }
    }

    pub fn observe(&mut self, committed: &str, observed: &str) -> CoalesceDecision {
        if committed == observed {
            return CoalesceDecision::Unchanged;
        }
        self.pending += 1;
        if self.pending >= self.threshold {
            self.pending = 0;
            CoalesceDecision::Commit
        } else {
            CoalesceDecision::Pending(self.pending)
        }
    }

    pub fn reset(&mut self) {
        self.pending = 0;
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

/// Result of feeding one observed text into the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Unchanged,
    Pending(usize),
    Committed {
        seq: u64,
        evicted: bool,
        redo_cleared: usize,
    },
}

pub struct HistoryStack {
    undo_stack: BoundedStack<Checkpoint>,
    redo_stack: BoundedStack<Checkpoint>,
    current: Checkpoint,
    /// Most recent uncommitted observation (what `flush` would commit).
    latest: Option<String>,
    coalescer: ChangeCoalescer,
    next_seq: u64,
    undo_evictions: u64,
    redo_evictions: u64,
}

impl HistoryStack {
    pub fn new(initial: &str) -> Self {
        Self::with_limits(initial, HISTORY_CAPACITY, COALESCE_THRESHOLD)
    }

    pub fn with_limits(initial: &str, capacity: usize, threshold: usize) -> Self {
        Self {
            undo_stack: BoundedStack::new(capacity),
            redo_stack: BoundedStack::new(capacity),
            current: Checkpoint {
                seq: 0,
                text: initial.to_owned(),
            },
            latest: None,
            coalescer: ChangeCoalescer::new(threshold),
            next_seq: 1,
            undo_evictions: 0,
            redo_evictions: 0,
        }
    }

    /// Feed the full buffer text observed after a mutation.
    pub fn push(&mut self, text: &str) -> PushOutcome {
        match self.coalescer.observe(&self.current.text, text) {
            CoalesceDecision::Unchanged => {
                self.latest = None;
                PushOutcome::Unchanged
            }
            CoalesceDecision::Pending(n) => {
                self.latest = Some(text.to_owned());
                trace!(target: "state.history", pending = n, "change_pending");
                PushOutcome::Pending(n)
            }
            CoalesceDecision::Commit => self.commit(text.to_owned()),
        }
    }

    /// Commit the latest uncommitted observation regardless of the counter.
    pub fn flush(&mut self) -> Option<PushOutcome> {
        let text = self.latest.take()?;
        if text == self.current.text {
            return None;
        }
        Some(self.commit(text))
    }

    fn commit(&mut self, text: String) -> PushOutcome {
        let seq = self.next_seq;
        self.next_seq += 1;
        let previous = std::mem::replace(&mut self.current, Checkpoint { seq, text });
        let evicted = self.undo_stack.push(previous).is_some();
        if evicted {
            self.undo_evictions += 1;
            trace!(target: "state.history", "undo_stack_trimmed");
        }
        let redo_cleared = self.redo_stack.clear();
        self.latest = None;
        self.coalescer.reset();
        trace!(target: "state.history", seq, undo_depth = self.undo_stack.len(), redo_cleared, "checkpoint_committed");
        PushOutcome::Committed {
            seq,
            evicted,
            redo_cleared,
        }
    }

    /// Step back one checkpoint. `None` when there is nothing to undo; the
    /// caller must then leave the visible buffer untouched.
    pub fn undo(&mut self) -> Option<&str> {
        let previous = self.undo_stack.pop()?;
        let current = std::mem::replace(&mut self.current, previous);
        if self.redo_stack.push(current).is_some() {
            self.redo_evictions += 1;
            trace!(target: "state.history", "redo_stack_trimmed");
        }
        self.coalescer.reset();
        self.latest = None;
        trace!(target: "state.history", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), seq = self.current.seq, "undo_pop");
        Some(&self.current.text)
    }

    pub fn redo(&mut self) -> Option<&str> {
        let next = self.redo_stack.pop()?;
        let current = std::mem::replace(&mut self.current, next);
        if self.undo_stack.push(current).is_some() {
            self.undo_evictions += 1;
            trace!(target: "state.history", "undo_stack_trimmed");
        }
        self.coalescer.reset();
        self.latest = None;
        trace!(target: "state.history", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), seq = self.current.seq, "redo_pop");
        Some(&self.current.text)
    }

    pub fn current_text(&self) -> &str {
        &self.current.text
    }
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
    /// An observation differing from the current checkpoint awaits commit.
    pub fn has_uncommitted(&self) -> bool {
        self.latest
            .as_deref()
            .is_some_and(|text| text != self.current.text)
    }
    pub fn pending_changes(&self) -> usize {
        self.coalescer.pending()
    }
    /// Total checkpoints committed since construction.
    pub fn commits(&self) -> u64 {
        self.next_seq - 1
    }
    pub fn evictions(&self, stack: StackKind) -> u64 {
        match stack {
            StackKind::Undo => self.undo_evictions,
            StackKind::Redo => self.redo_evictions,
        }
    }

    /// Drop both stacks and any pending observation; the current checkpoint stays.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.latest = None;
        self.coalescer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Push `n` successive distinct texts ("t1", "t2", ...).
    fn push_edits(h: &mut HistoryStack, n: usize) -> Vec<PushOutcome> {
        (1..=n).map(|i| h.push(&format!("t{i}"))).collect()
    }

    #[test]
    fn commits_once_per_threshold_edits() {
        for edits in [0usize, 4, 5, 9, 10, 23] {
            let mut h = HistoryStack::new("");
            push_edits(&mut h, edits);
            assert_eq!(h.commits() as usize, edits / COALESCE_THRESHOLD, "edits={edits}");
            assert_eq!(h.undo_depth(), edits / COALESCE_THRESHOLD);
            assert_eq!(h.pending_changes(), edits % COALESCE_THRESHOLD);
        }
    }

    #[test]
    fn fifth_change_commits_previous_text() {
        let mut h = HistoryStack::new("base");
        let outcomes = push_edits(&mut h, 5);
        assert_eq!(outcomes[3], PushOutcome::Pending(4));
        assert_eq!(
            outcomes[4],
            PushOutcome::Committed {
                seq: 1,
                evicted: false,
                redo_cleared: 0
            }
        );
        assert_eq!(h.current_text(), "t5");
        assert_eq!(h.undo(), Some("base"));
    }

    #[test]
    fn identical_text_does_not_count() {
        let mut h = HistoryStack::new("same");
        for _ in 0..10 {
            assert_eq!(h.push("same"), PushOutcome::Unchanged);
        }
        assert_eq!(h.pending_changes(), 0);
        assert_eq!(h.commits(), 0);
    }

    #[test]
    fn undo_on_empty_is_none() {
        let mut h = HistoryStack::new("x");
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo(), None);
        assert_eq!(h.current_text(), "x");
    }

    #[test]
    fn undo_then_redo_restores() {
        let mut h = HistoryStack::with_limits("a", 64, 1);
        h.push("ab");
        h.push("abc");
        assert_eq!(h.undo(), Some("ab"));
        assert_eq!(h.redo(), Some("abc"));
        assert_eq!(h.undo_depth(), 2);
        assert_eq!(h.redo_depth(), 0);
    }

    #[test]
    fn undo_resets_pending_counter() {
        let mut h = HistoryStack::with_limits("", 64, 5);
        push_edits(&mut h, 7);
        assert_eq!(h.pending_changes(), 2);
        h.undo();
        assert_eq!(h.pending_changes(), 0);
        assert_eq!(h.flush(), None);
    }

    #[test]
    fn commit_after_undo_clears_redo() {
        let mut h = HistoryStack::with_limits("0", 64, 1);
        h.push("1");
        h.push("2");
        h.push("3");
        h.undo();
        h.undo();
        assert_eq!(h.redo_depth(), 2);
        let outcome = h.push("branch");
        assert_eq!(
            outcome,
            PushOutcome::Committed {
                seq: 4,
                evicted: false,
                redo_cleared: 2
            }
        );
        assert_eq!(h.redo_depth(), 0);
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn pending_push_after_undo_keeps_redo() {
        let mut h = HistoryStack::with_limits("0", 64, 5);
        push_edits(&mut h, 5);
        h.undo();
        h.push("typing");
        assert_eq!(h.redo_depth(), 1);
    }

    #[test]
    fn sixty_fifth_commit_evicts_oldest() {
        let mut h = HistoryStack::with_limits("start", HISTORY_CAPACITY, 1);
        for i in 0..HISTORY_CAPACITY {
            assert!(matches!(
                h.push(&format!("v{i}")),
                PushOutcome::Committed { evicted: false, .. }
            ));
        }
        assert_eq!(h.undo_depth(), HISTORY_CAPACITY);
        assert!(matches!(
            h.push("overflow"),
            PushOutcome::Committed { evicted: true, .. }
        ));
        assert_eq!(h.undo_depth(), HISTORY_CAPACITY);
        assert_eq!(h.evictions(StackKind::Undo), 1);
        let mut last = None;
        while let Some(t) = h.undo() {
            last = Some(t.to_owned());
        }
        // "start" was evicted; the oldest reachable text is "v0".
        assert_eq!(last.as_deref(), Some("v0"));
    }

    #[test]
    fn flush_commits_pending_tail() {
        let mut h = HistoryStack::new("a");
        h.push("ab");
        h.push("abc");
        let outcome = h.flush();
        assert!(matches!(outcome, Some(PushOutcome::Committed { seq: 1, .. })));
        assert_eq!(h.current_text(), "abc");
        assert_eq!(h.undo(), Some("a"));
    }

    #[test]
    fn reverting_to_committed_text_drops_latest() {
        let mut h = HistoryStack::new("a");
        h.push("ab");
        assert!(h.has_uncommitted());
        assert_eq!(h.push("a"), PushOutcome::Unchanged);
        assert!(!h.has_uncommitted());
        assert_eq!(h.flush(), None);
    }

    #[test]
    fn clear_keeps_current() {
        let mut h = HistoryStack::with_limits("a", 4, 1);
        h.push("b");
        h.push("c");
        h.undo();
        h.clear();
        assert!(!h.can_undo());
        assert!(!h.can_redo());
        assert_eq!(h.current_text(), "b");
    }
}
