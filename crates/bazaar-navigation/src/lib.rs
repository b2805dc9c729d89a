//! Bazaar Navigation
//!
//! The session layer asks for navigation through the [`Navigator`] port and
//! never talks to a router directly. Implementations here:
//! - [`RecordingNavigator`] keeps targets in memory
//! - [`HistoryNavigator`] persists every navigation to the durable store
//!
//! [`Routes`] knows where the registration flow and the default landing page live.

mod error;
mod history;
mod navigator;
mod routes;

pub use error::NavigationError;
pub use history::{HistoryEntry, HistoryNavigator};
pub use navigator::{Navigator, RecordingNavigator};
pub use routes::Routes;

pub type Result<T> = std::result::Result<T, NavigationError>;
