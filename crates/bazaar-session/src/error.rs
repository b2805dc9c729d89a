//! Session error types

use thiserror::Error;

use crate::state::RegistrationStep;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] bazaar_storage::StorageError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] bazaar_navigation::NavigationError),

    #[error("No registration in progress")]
    NoRegistrationInProgress,

    #[error("Registration already complete")]
    RegistrationFinished,

    #[error("Invalid registration step transition: {from} -> {to}")]
    InvalidStepTransition {
        from: RegistrationStep,
        to: RegistrationStep,
    },
}
