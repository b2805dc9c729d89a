//! Bazaar Core
//!
//! Wires configuration, the durable store, navigation and session views
//! together for a host application.

mod app;
mod config;
mod error;

pub use app::App;
pub use config::Config;
pub use error::CoreError;

// Re-export core components
pub use bazaar_navigation::{
    HistoryEntry, HistoryNavigator, NavigationError, Navigator, RecordingNavigator, Routes,
};
pub use bazaar_session::{
    derive_status, keys, ObserverId, PersistedFlags, RegistrationStep, SessionError,
    SessionManager, SessionState, SessionStatus, SessionStore,
};
pub use bazaar_storage::{Database, KeyValueStore, MemoryStore, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    init_logging_with("info");
}

/// Initialize logging with a fallback filter used when `RUST_LOG` is unset
pub fn init_logging_with(default_filter: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Logs go to stderr so command output on stdout stays machine-readable
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
