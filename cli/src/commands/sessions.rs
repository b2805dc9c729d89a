//! Session commands
use serde::{Deserialize, Serialize};

use bazaar_core::{RegistrationStep, SessionManager, SessionState};

use super::CommandResult;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub status: String,
    pub is_logged_in: bool,
    pub is_guest: bool,
    pub registration_step: Option<String>,
    pub pending_action: Option<String>,
    /// Where the command navigated, if it navigated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigated_to: Option<String>,
}

impl SessionInfo {
    fn from_state(state: SessionState, navigated_to: Option<String>) -> Self {
        Self {
            status: state.status().to_string(),
            is_logged_in: state.is_logged_in(),
            is_guest: state.is_guest(),
            registration_step: state.registration_step().map(|step| step.to_string()),
            pending_action: state.pending_action().map(str::to_string),
            navigated_to,
        }
    }

    fn from_view(view: &SessionManager) -> Self {
        Self::from_state(view.state(), None)
    }
}

pub fn get_status(state: &AppState) -> CommandResult<SessionInfo> {
    state
        .with_view(|view| Ok(SessionInfo::from_view(view)))
        .into()
}

pub fn login(state: &AppState) -> CommandResult<SessionInfo> {
    state
        .with_view(|view| {
            view.login()?;
            Ok(SessionInfo::from_view(view))
        })
        .into()
}

pub fn logout(state: &AppState) -> CommandResult<SessionInfo> {
    state
        .with_view(|view| {
            view.logout()?;
            Ok(SessionInfo::from_view(view))
        })
        .into()
}

pub fn continue_as_guest(state: &AppState) -> CommandResult<SessionInfo> {
    state
        .with_view(|view| {
            view.continue_as_guest()?;
            Ok(SessionInfo::from_view(view))
        })
        .into()
}

pub fn start_registration(state: &AppState, then: Option<String>) -> CommandResult<SessionInfo> {
    state
        .with_view(|view| {
            let entry = view.start_registration(then.as_deref())?;
            Ok(SessionInfo::from_state(view.state(), Some(entry)))
        })
        .into()
}

pub fn set_registration_step(state: &AppState, step: String) -> CommandResult<SessionInfo> {
    let step = match step.parse::<RegistrationStep>() {
        Ok(step) => step,
        Err(e) => return CommandResult::err(e),
    };

    state
        .with_view(|view| {
            view.update_registration_step(step)?;
            Ok(SessionInfo::from_view(view))
        })
        .into()
}

pub fn advance_registration(state: &AppState) -> CommandResult<SessionInfo> {
    state
        .with_view(|view| {
            view.advance_registration()?;
            Ok(SessionInfo::from_view(view))
        })
        .into()
}

pub fn complete_registration(state: &AppState) -> CommandResult<SessionInfo> {
    state
        .with_view(|view| {
            let target = view.complete_registration()?;
            Ok(SessionInfo::from_state(view.state(), Some(target)))
        })
        .into()
}

pub fn reset(state: &AppState) -> CommandResult<SessionInfo> {
    state
        .app()
        .reset()
        .and_then(|()| state.with_view(|view| Ok(SessionInfo::from_view(view))))
        .into()
}
