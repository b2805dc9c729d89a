//! In-memory key-value store

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::store::{KeyValueStore, Mutation};
use crate::Result;

/// Volatile store, shared between clones.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }

    // Holds the write lock for the whole batch so readers never see half of it
    fn apply(&self, mutations: &[Mutation]) -> Result<()> {
        let mut entries = self.entries.write();
        for mutation in mutations {
            match mutation {
                Mutation::Set { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                Mutation::Remove { key } => {
                    entries.remove(key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("isGuest").unwrap(), None);

        store.set("isGuest", "true").unwrap();
        assert_eq!(store.get("isGuest").unwrap().as_deref(), Some("true"));

        store.remove("isGuest").unwrap();
        assert_eq!(store.get("isGuest").unwrap(), None);

        // Removing again is a no-op
        store.remove("isGuest").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("pendingAction", "/wallet").unwrap();
        assert_eq!(other.get("pendingAction").unwrap().as_deref(), Some("/wallet"));

        other.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_apply_batch() {
        let store = MemoryStore::new();
        store.set("registrationStep", "contact").unwrap();

        store
            .apply(&[
                Mutation::set("isLoggedIn", "true"),
                Mutation::set("isGuest", "false"),
                Mutation::remove("registrationStep"),
            ])
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("isLoggedIn").unwrap().as_deref(), Some("true"));
        assert_eq!(store.get("registrationStep").unwrap(), None);
    }
}
