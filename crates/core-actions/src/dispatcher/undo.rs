//! Undo / Redo dispatch.

use super::{DispatchResult, Outcome};
use core_state::EditorSession;

pub(crate) fn handle_undo(session: &mut EditorSession) -> DispatchResult {
    match session.undo() {
        Ok(Some(apply)) => {
            tracing::trace!(target: "actions.dispatch", op = "undo", undo_depth = session.undo_depth(), redo_depth = session.redo_depth(), "undo");
            DispatchResult::applied(apply, Outcome::Restored)
        }
        Ok(None) => DispatchResult::clean(Outcome::NothingToDo),
        Err(e) => DispatchResult::rejected(e),
    }
}

pub(crate) fn handle_redo(session: &mut EditorSession) -> DispatchResult {
    match session.redo() {
        Ok(Some(apply)) => {
            tracing::trace!(target: "actions.dispatch", op = "redo", undo_depth = session.undo_depth(), redo_depth = session.redo_depth(), "redo");
            DispatchResult::applied(apply, Outcome::Restored)
        }
        Ok(None) => DispatchResult::clean(Outcome::NothingToDo),
        Err(e) => DispatchResult::rejected(e),
    }
}
