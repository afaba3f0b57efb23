//! Find / replace dialog actions.
//!
//! Every search starts after the current selection so repeated "find" walks
//! forward through the document. Replacements go through
//! `EditorSession::apply_edit`, so each replace (including a whole
//! replace-all) is a single undo step.

use super::{DispatchResult, Outcome};
use core_events::EditorEvent;
use core_search::{SearchFlags, SearchMatch, SearchQuery, find_next, replace_all, replace_one};
use core_state::EditorSession;

fn query(pattern: &str, flags: SearchFlags, session: &EditorSession) -> Option<SearchQuery> {
    match SearchQuery::new(pattern, flags) {
        Ok(q) => Some(q),
        Err(e) => {
            tracing::debug!(target: "actions.dispatch", error = %e, "invalid_pattern");
            session.emit(EditorEvent::InvalidPattern);
            None
        }
    }
}

fn report_hit(session: &EditorSession, m: SearchMatch) {
    session.emit(EditorEvent::SearchHit {
        start: m.start,
        end: m.end,
    });
}

fn report_miss(session: &EditorSession, pattern: &str) -> DispatchResult {
    session.emit(EditorEvent::SearchMiss {
        pattern_len: pattern.chars().count(),
    });
    DispatchResult::clean(Outcome::NotFound)
}

pub(crate) fn handle_find(
    pattern: &str,
    flags: SearchFlags,
    session: &mut EditorSession,
) -> DispatchResult {
    let Some(q) = query(pattern, flags, session) else {
        return DispatchResult::clean(Outcome::InvalidPattern);
    };
    match find_next(session.buffer(), &q, session.selection().end) {
        Some(m) => {
            session.set_selection(m.selection());
            report_hit(session, m);
            DispatchResult::dirty(Outcome::Found(m))
        }
        None => report_miss(session, pattern),
    }
}

pub(crate) fn handle_replace(
    pattern: &str,
    replacement: &str,
    flags: SearchFlags,
    session: &mut EditorSession,
) -> DispatchResult {
    let Some(q) = query(pattern, flags, session) else {
        return DispatchResult::clean(Outcome::InvalidPattern);
    };
    let before = session.selection();
    let step = replace_one(session.buffer(), &q, replacement, before);
    if !step.replaced {
        // a selection that moved is the next match
        if step.selection == before {
            return report_miss(session, pattern);
        }
        session.set_selection(step.selection);
        let m = SearchMatch {
            start: step.selection.start,
            end: step.selection.end,
        };
        report_hit(session, m);
        return DispatchResult::dirty(Outcome::Found(m));
    }
    match session.apply_edit(&step.buffer.text(), step.selection) {
        Ok(apply) => {
            session.emit(EditorEvent::Replaced { count: 1 });
            DispatchResult {
                dirty: true,
                apply,
                outcome: Outcome::Replaced(1),
            }
        }
        Err(e) => DispatchResult::rejected(e),
    }
}

pub(crate) fn handle_replace_all(
    pattern: &str,
    replacement: &str,
    flags: SearchFlags,
    session: &mut EditorSession,
) -> DispatchResult {
    let Some(q) = query(pattern, flags, session) else {
        return DispatchResult::clean(Outcome::InvalidPattern);
    };
    let (out, count) = replace_all(session.buffer(), &q, replacement);
    session.emit(EditorEvent::Replaced { count });
    if count == 0 {
        return DispatchResult::clean(Outcome::Replaced(0));
    }
    let selection = session.selection();
    match session.apply_edit(&out.text(), selection) {
        Ok(apply) => DispatchResult {
            dirty: true,
            apply,
            outcome: Outcome::Replaced(count),
        },
        Err(e) => DispatchResult::rejected(e),
    }
}
