//! Bazaar Session Management
//!
//! Tracks whether the current client is signed in, browsing as a guest, or
//! neither, plus an in-progress registration flow.
//! - State is only ever rebuilt from the durable store
//! - Every mutation writes the store first, then memory, then broadcasts
//! - Every manager sharing a store refreshes on each broadcast

mod error;
mod manager;
mod state;
mod store;

pub use error::SessionError;
pub use manager::{ObserverId, SessionManager};
pub use state::{derive_status, keys, PersistedFlags, RegistrationStep, SessionState, SessionStatus};
pub use store::{SessionStore, Subscription};

pub type Result<T> = std::result::Result<T, SessionError>;
