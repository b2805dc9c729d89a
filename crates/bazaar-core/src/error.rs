//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] bazaar_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] bazaar_session::SessionError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] bazaar_navigation::NavigationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
