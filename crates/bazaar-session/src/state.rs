//! Session state
//!
//! ```text
//! Loading ──refresh──▶ Unauthenticated ◀──logout── Guest / Authenticated
//!                          │ login                 ▲ continue_as_guest
//!                          ▼                       │
//!                     Authenticated ◀──login── Guest
//! ```
//!
//! Registration progress is tracked alongside the status:
//! basic → contact → verification → complete

use serde::{Deserialize, Serialize};

/// Keys in the durable store.
pub mod keys {
    pub const LOGGED_IN: &str = "isLoggedIn";
    pub const GUEST: &str = "isGuest";
    pub const REGISTRATION_STEP: &str = "registrationStep";
    pub const PENDING_ACTION: &str = "pendingAction";

    pub const ALL: [&str; 4] = [LOGGED_IN, GUEST, REGISTRATION_STEP, PENDING_ACTION];
}

pub(crate) const TRUE: &str = "true";
pub(crate) const FALSE: &str = "false";

pub(crate) fn flag_value(flag: bool) -> &'static str {
    if flag {
        TRUE
    } else {
        FALSE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Not yet read from the store
    Loading,
    Authenticated,
    Guest,
    Unauthenticated,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Loading => "loading",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Guest => "guest",
            SessionStatus::Unauthenticated => "unauthenticated",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStep {
    Basic,
    Contact,
    Verification,
    Complete,
}

impl RegistrationStep {
    pub const ALL: [RegistrationStep; 4] = [
        RegistrationStep::Basic,
        RegistrationStep::Contact,
        RegistrationStep::Verification,
        RegistrationStep::Complete,
    ];

    /// The step that follows this one, `None` after `Complete`.
    pub fn next(&self) -> Option<RegistrationStep> {
        match self {
            RegistrationStep::Basic => Some(RegistrationStep::Contact),
            RegistrationStep::Contact => Some(RegistrationStep::Verification),
            RegistrationStep::Verification => Some(RegistrationStep::Complete),
            RegistrationStep::Complete => None,
        }
    }

    /// Forward moves go one step at a time; going back to any earlier step is allowed.
    pub fn can_advance_to(&self, target: RegistrationStep) -> bool {
        target <= *self || self.next() == Some(target)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStep::Basic => "basic",
            RegistrationStep::Contact => "contact",
            RegistrationStep::Verification => "verification",
            RegistrationStep::Complete => "complete",
        }
    }
}

impl std::fmt::Display for RegistrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RegistrationStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(RegistrationStep::Basic),
            "contact" => Ok(RegistrationStep::Contact),
            "verification" => Ok(RegistrationStep::Verification),
            "complete" => Ok(RegistrationStep::Complete),
            _ => Err(format!("Unknown registration step: {}", s)),
        }
    }
}

/// The four persisted fields, as read from or written to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedFlags {
    pub logged_in: bool,
    pub guest: bool,
    pub registration_step: Option<RegistrationStep>,
    pub pending_action: Option<String>,
}

/// Authenticated beats guest beats unauthenticated.
pub fn derive_status(flags: &PersistedFlags) -> SessionStatus {
    if flags.logged_in {
        SessionStatus::Authenticated
    } else if flags.guest {
        SessionStatus::Guest
    } else {
        SessionStatus::Unauthenticated
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    status: SessionStatus,
    registration_step: Option<RegistrationStep>,
    pending_action: Option<String>,
}

impl SessionState {
    pub(crate) fn loading() -> Self {
        Self {
            status: SessionStatus::Loading,
            registration_step: None,
            pending_action: None,
        }
    }

    pub(crate) fn from_flags(flags: PersistedFlags) -> Self {
        Self {
            status: derive_status(&flags),
            registration_step: flags.registration_step,
            pending_action: flags.pending_action,
        }
    }

    /// Flags this state would persist as. `Loading` maps to neither flag.
    pub(crate) fn flags(&self) -> PersistedFlags {
        PersistedFlags {
            logged_in: self.is_logged_in(),
            guest: self.is_guest(),
            registration_step: self.registration_step,
            pending_action: self.pending_action.clone(),
        }
    }

    pub(crate) fn set_registration_step(&mut self, step: Option<RegistrationStep>) {
        self.registration_step = step;
    }

    pub(crate) fn set_pending_action(&mut self, pending_action: Option<String>) {
        self.pending_action = pending_action;
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_logged_in(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    pub fn is_guest(&self) -> bool {
        self.status == SessionStatus::Guest
    }

    pub fn is_loading(&self) -> bool {
        self.status == SessionStatus::Loading
    }

    pub fn registration_step(&self) -> Option<RegistrationStep> {
        self.registration_step
    }

    pub fn pending_action(&self) -> Option<&str> {
        self.pending_action.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(logged_in: bool, guest: bool) -> PersistedFlags {
        PersistedFlags {
            logged_in,
            guest,
            ..Default::default()
        }
    }

    #[test]
    fn test_derive_status_priority() {
        assert_eq!(derive_status(&flags(true, true)), SessionStatus::Authenticated);
        assert_eq!(derive_status(&flags(true, false)), SessionStatus::Authenticated);
        assert_eq!(derive_status(&flags(false, true)), SessionStatus::Guest);
        assert_eq!(derive_status(&flags(false, false)), SessionStatus::Unauthenticated);
    }

    #[test]
    fn test_flags_never_both_set() {
        // Both flags persisted at once still yields a single status
        let state = SessionState::from_flags(flags(true, true));
        assert!(state.is_logged_in());
        assert!(!state.is_guest());

        let roundtrip = state.flags();
        assert!(roundtrip.logged_in);
        assert!(!roundtrip.guest);
    }

    #[test]
    fn test_loading_state() {
        let state = SessionState::loading();
        assert!(state.is_loading());
        assert!(!state.is_logged_in());
        assert!(!state.is_guest());
        assert_eq!(state.flags(), PersistedFlags::default());
    }

    #[test]
    fn test_step_sequence() {
        assert_eq!(RegistrationStep::Basic.next(), Some(RegistrationStep::Contact));
        assert_eq!(
            RegistrationStep::Verification.next(),
            Some(RegistrationStep::Complete)
        );
        assert_eq!(RegistrationStep::Complete.next(), None);
    }

    #[test]
    fn test_valid_step_transitions() {
        assert!(RegistrationStep::Basic.can_advance_to(RegistrationStep::Basic));
        assert!(RegistrationStep::Basic.can_advance_to(RegistrationStep::Contact));
        assert!(RegistrationStep::Verification.can_advance_to(RegistrationStep::Basic));
        assert!(RegistrationStep::Verification.can_advance_to(RegistrationStep::Complete));
    }

    #[test]
    fn test_invalid_step_transitions() {
        // Can't skip ahead
        assert!(!RegistrationStep::Basic.can_advance_to(RegistrationStep::Verification));
        assert!(!RegistrationStep::Basic.can_advance_to(RegistrationStep::Complete));
        assert!(!RegistrationStep::Contact.can_advance_to(RegistrationStep::Complete));
    }

    #[test]
    fn test_step_parse() {
        for step in RegistrationStep::ALL {
            assert_eq!(step.as_str().parse::<RegistrationStep>(), Ok(step));
        }
        assert!("Basic".parse::<RegistrationStep>().is_err());
        assert!("".parse::<RegistrationStep>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let state = SessionState::from_flags(flags(false, true));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "guest");
        assert_eq!(json["registration_step"], serde_json::Value::Null);
    }
}
