//! Navigation error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Invalid navigation target: {0:?}")]
    InvalidTarget(String),

    #[error("Storage error: {0}")]
    Storage(#[from] bazaar_storage::StorageError),
}
