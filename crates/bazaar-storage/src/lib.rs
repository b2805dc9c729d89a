//! Bazaar Storage Layer
//!
//! Durable key-value storage for client-local state.
//! Values are plain strings, the same shape a browser's local storage holds.
//! `Database` persists them in SQLite; `MemoryStore` keeps them in memory.

mod database;
mod error;
mod memory;
mod migrations;
mod store;

pub use database::Database;
pub use error::StorageError;
pub use memory::MemoryStore;
pub use store::{KeyValueStore, Mutation};

pub type Result<T> = std::result::Result<T, StorageError>;
