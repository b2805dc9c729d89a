//! Key-value persistence port
//!
//! Anything that can hold string values under string keys can back a
//! session. Operations that touch several keys go through [`KeyValueStore::apply`]
//! so backends with transactions can write them together.

use crate::Result;

/// A single write against a key-value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Set { key: String, value: String },
    Remove { key: String },
}

impl Mutation {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Mutation::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Mutation::Remove { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            Mutation::Set { key, .. } | Mutation::Remove { key } => key,
        }
    }
}

pub trait KeyValueStore: Send + Sync {
    /// Read a value. Missing keys are `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Remove every key.
    fn clear(&self) -> Result<()>;

    /// Apply a batch of writes in order.
    fn apply(&self, mutations: &[Mutation]) -> Result<()> {
        for mutation in mutations {
            match mutation {
                Mutation::Set { key, value } => self.set(key, value)?,
                Mutation::Remove { key } => self.remove(key)?,
            }
        }
        Ok(())
    }
}
