//! Session store
//!
//! Owns the durable key-value backend and the list of parties to notify when
//! it changes. Every manager sharing a `SessionStore` sees every broadcast.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use bazaar_storage::{KeyValueStore, Mutation};

use crate::state::{keys, PersistedFlags, RegistrationStep, TRUE};
use crate::Result;

type Subscriber = Arc<dyn Fn() + Send + Sync>;
type SubscriberList = RwLock<Vec<(u64, Subscriber)>>;

pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    subscribers: Arc<SubscriberList>,
    next_id: Arc<AtomicU64>,
}

impl SessionStore {
    pub fn new<S: KeyValueStore + 'static>(backend: S) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    pub fn from_shared(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            subscribers: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    /// Read the four session fields. Missing or malformed values read as false/None.
    pub fn load(&self) -> Result<PersistedFlags> {
        Ok(read_flags(self.backend.as_ref())?)
    }

    pub fn pending_action(&self) -> Result<Option<String>> {
        Ok(self.backend.get(keys::PENDING_ACTION)?)
    }

    /// Write a batch without notifying anyone.
    pub fn apply(&self, mutations: &[Mutation]) -> Result<()> {
        self.backend.apply(mutations)?;
        tracing::debug!(
            keys = ?mutations.iter().map(Mutation::key).collect::<Vec<_>>(),
            "Session store written"
        );
        Ok(())
    }

    /// Remove every session key and notify subscribers.
    pub fn reset(&self) -> Result<()> {
        let mutations: Vec<Mutation> = keys::ALL.iter().map(|key| Mutation::remove(*key)).collect();
        self.apply(&mutations)?;
        self.broadcast();
        Ok(())
    }

    /// Register a callback run after every broadcast.
    ///
    /// The callback stays registered until the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().push((id, Arc::new(callback)));

        Subscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Run every subscriber synchronously.
    ///
    /// The subscriber list is not locked while callbacks run, so a callback may
    /// write to the store, broadcast again, or subscribe.
    pub fn broadcast(&self) {
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        tracing::debug!(subscribers = subscribers.len(), "Broadcasting session change");

        for callback in subscribers {
            callback();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            subscribers: Arc::clone(&self.subscribers),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

/// Unregisters its callback when dropped.
pub struct Subscription {
    id: u64,
    subscribers: Weak<SubscriberList>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.write().retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

pub(crate) fn read_flags(backend: &dyn KeyValueStore) -> bazaar_storage::Result<PersistedFlags> {
    let logged_in = backend.get(keys::LOGGED_IN)?.as_deref() == Some(TRUE);
    let guest = backend.get(keys::GUEST)?.as_deref() == Some(TRUE);

    let registration_step = backend
        .get(keys::REGISTRATION_STEP)?
        .and_then(|raw| match raw.parse::<RegistrationStep>() {
            Ok(step) => Some(step),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring stored registration step");
                None
            }
        });

    let pending_action = backend.get(keys::PENDING_ACTION)?;

    Ok(PersistedFlags {
        logged_in,
        guest,
        registration_step,
        pending_action,
    })
}
