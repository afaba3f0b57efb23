//! Change notifications and selection updates coming from the UI.

use super::{DispatchResult, Outcome};
use core_state::{EditOp, EditorSession};
use core_text::Selection;

pub(crate) fn handle_text_changed(text: &str, session: &mut EditorSession) -> DispatchResult {
    match session.on_text_changed(text) {
        Ok(()) => {
            tracing::trace!(target: "actions.dispatch", op = "text_changed", len = text.len(), "edit");
            DispatchResult::dirty(Outcome::Edited)
        }
        Err(e) => DispatchResult::rejected(e),
    }
}

pub(crate) fn handle_edit_op(op: EditOp, session: &mut EditorSession) -> DispatchResult {
    let pos = op.pos();
    match session.on_edit_op(op) {
        Ok(()) => {
            tracing::trace!(target: "actions.dispatch", op = "edit", pos, "edit");
            DispatchResult::dirty(Outcome::Edited)
        }
        Err(e) => {
            tracing::debug!(target: "actions.dispatch", op = "edit", pos, error = %e, "edit_rejected");
            DispatchResult::rejected(e)
        }
    }
}

pub(crate) fn handle_select(selection: Selection, session: &mut EditorSession) -> DispatchResult {
    let before = session.selection();
    session.set_selection(selection);
    if session.selection() == before {
        DispatchResult::clean(Outcome::Selected)
    } else {
        DispatchResult::dirty(Outcome::Selected)
    }
}
