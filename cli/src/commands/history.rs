//! Navigation history commands
use bazaar_core::HistoryEntry;

use super::CommandResult;
use crate::state::AppState;

pub fn get_history(state: &AppState, limit: usize) -> CommandResult<Vec<HistoryEntry>> {
    state.app().navigation_history(limit).into()
}
