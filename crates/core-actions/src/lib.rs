//! Editor commands: the UI-facing layer over `EditorSession`.
//!
//! A front end turns its callbacks (text changed, undo/redo menu items, the
//! find/replace dialog buttons) into `Action`s and hands them to `dispatch`.
//! The `DispatchResult` says whether anything changed, carries the content
//! the UI must render, and classifies the outcome for status messages.

use core_config::Config;
use core_search::SearchFlags;
use core_state::{EditOp, HistoryStrategy, SessionOptions};
use core_text::Selection;

pub mod dispatcher;

pub use dispatcher::{DispatchResult, Outcome, dispatch};

/// One user or UI intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// UI reports the full buffer text after a user edit.
    TextChanged(String),
    /// UI reports a positional edit.
    Edit(EditOp),
    Undo,
    Redo,
    /// Select the next match after the current selection.
    Find { pattern: String, flags: SearchFlags },
    /// Replace the selected match and select the next one.
    Replace {
        pattern: String,
        replacement: String,
        flags: SearchFlags,
    },
    ReplaceAll {
        pattern: String,
        replacement: String,
        flags: SearchFlags,
    },
    Select(Selection),
}

/// Observer for dispatched actions (invoked before the action is applied).
pub trait ActionObserver: Send + Sync {
    fn on_action(&self, _action: &Action) {}
}

/// Session settings derived from the loaded configuration.
pub fn session_options(config: &Config) -> SessionOptions {
    let history = config.effective_history();
    SessionOptions {
        strategy: match history.strategy {
            core_config::StrategyKind::Delta => HistoryStrategy::Delta,
            core_config::StrategyKind::Snapshot => HistoryStrategy::Snapshot,
        },
        capacity: history.capacity,
        coalesce_threshold: history.coalesce_threshold,
        suppress_echo: history.suppress_echo,
    }
}

/// Initial state of the find dialog's check boxes.
pub fn default_search_flags(config: &Config) -> SearchFlags {
    let search = config.search();
    let mut flags = SearchFlags::empty();
    flags.set(SearchFlags::CASE_SENSITIVE, search.case_sensitive);
    flags.set(SearchFlags::WHOLE_WORD, search.whole_word);
    flags
}
