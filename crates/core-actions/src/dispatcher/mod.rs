//! Dispatcher applying `Action` to an `EditorSession`.
//!
//! Sub-modules:
//! * `edit`   - change notifications and selection updates from the UI
//! * `undo`   - undo / redo
//! * `search` - find, replace, replace all

use crate::{Action, ActionObserver};
use core_search::SearchMatch;
use core_state::{Apply, EditorSession, HistoryError};

mod edit;
mod search;
mod undo;

/// How an action resolved, for status messages and scripting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A change notification or edit was recorded.
    Edited,
    Selected,
    /// Undo or redo restored an earlier state.
    Restored,
    /// Undo/redo with an empty stack.
    NothingToDo,
    Found(SearchMatch),
    NotFound,
    Replaced(usize),
    /// Empty find pattern; the dialog should re-prompt.
    InvalidPattern,
    /// The session refused the action (buffer left as it was).
    Rejected(HistoryError),
}

/// Result of dispatching a single `Action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    /// Session state changed; the UI should refresh.
    pub dirty: bool,
    /// Programmatic content change the UI must render.
    pub apply: Option<Apply>,
    pub outcome: Outcome,
}

impl DispatchResult {
    pub fn dirty(outcome: Outcome) -> Self {
        Self {
            dirty: true,
            apply: None,
            outcome,
        }
    }
    pub fn clean(outcome: Outcome) -> Self {
        Self {
            dirty: false,
            apply: None,
            outcome,
        }
    }
    pub fn applied(apply: Apply, outcome: Outcome) -> Self {
        Self {
            dirty: true,
            apply: Some(apply),
            outcome,
        }
    }
    pub fn rejected(error: HistoryError) -> Self {
        Self::clean(Outcome::Rejected(error))
    }
}

/// Apply an action to the session.
pub fn dispatch(
    action: Action,
    session: &mut EditorSession,
    observers: &[Box<dyn ActionObserver>],
) -> DispatchResult {
    for obs in observers {
        obs.on_action(&action);
    }

    let result = match action {
        Action::TextChanged(text) => edit::handle_text_changed(&text, session),
        Action::Edit(op) => edit::handle_edit_op(op, session),
        Action::Select(selection) => edit::handle_select(selection, session),
        Action::Undo => undo::handle_undo(session),
        Action::Redo => undo::handle_redo(session),
        Action::Find { pattern, flags } => search::handle_find(&pattern, flags, session),
        Action::Replace {
            pattern,
            replacement,
            flags,
        } => search::handle_replace(&pattern, &replacement, flags, session),
        Action::ReplaceAll {
            pattern,
            replacement,
            flags,
        } => search::handle_replace_all(&pattern, &replacement, flags, session),
    };
    tracing::trace!(target: "actions.dispatch", dirty = result.dirty, outcome = ?result.outcome, "dispatched");
    result
}
