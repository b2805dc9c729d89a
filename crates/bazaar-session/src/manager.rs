//! Session Manager
//!
//! One manager per open view. Mutations write the store, update this
//! manager's state, then broadcast so every manager on the store refreshes.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use bazaar_navigation::{Navigator, Routes};
use bazaar_storage::{KeyValueStore, Mutation};

use crate::error::SessionError;
use crate::state::{flag_value, keys, PersistedFlags, RegistrationStep, SessionState};
use crate::store::{read_flags, SessionStore, Subscription};
use crate::Result;

type Observer = Arc<dyn Fn(&SessionState) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Default)]
struct Observers {
    next_id: AtomicU64,
    entries: RwLock<Vec<(ObserverId, Observer)>>,
}

impl Observers {
    fn notify(&self, state: &SessionState) {
        let observers: Vec<Observer> = self
            .entries
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            observer(state);
        }
    }
}

pub struct SessionManager {
    /// Identifies this view in logs
    id: Uuid,
    state: Arc<RwLock<SessionState>>,
    observers: Arc<Observers>,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    routes: Routes,
    /// Keeps this manager subscribed to the store until the last clone drops
    _subscription: Arc<Subscription>,
}

impl SessionManager {
    /// Create a manager in the `Loading` state, subscribed to `store`.
    pub fn new(store: SessionStore, navigator: Arc<dyn Navigator>, routes: Routes) -> Self {
        let id = Uuid::new_v4();
        let state = Arc::new(RwLock::new(SessionState::loading()));
        let observers = Arc::new(Observers::default());

        let subscription = {
            let backend = Arc::clone(store.backend());
            let state = Arc::downgrade(&state);
            let observers = Arc::downgrade(&observers);

            store.subscribe(move || {
                let (Some(state), Some(observers)) = (state.upgrade(), observers.upgrade()) else {
                    return;
                };
                if let Err(e) = reload(backend.as_ref(), &state, &observers) {
                    tracing::warn!(manager_id = %id, error = %e, "Failed to refresh session after change");
                }
            })
        };

        tracing::debug!(manager_id = %id, "Created session manager");

        Self {
            id,
            state,
            observers,
            store,
            navigator,
            routes,
            _subscription: Arc::new(subscription),
        }
    }

    /// Create a manager and load its state from the store.
    pub fn open(store: SessionStore, navigator: Arc<dyn Navigator>, routes: Routes) -> Result<Self> {
        let manager = Self::new(store, navigator, routes);
        manager.refresh()?;
        Ok(manager)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.read().is_logged_in()
    }

    pub fn is_guest(&self) -> bool {
        self.state.read().is_guest()
    }

    /// Rebuild state from the store. Safe to call any number of times.
    pub fn refresh(&self) -> Result<SessionState> {
        reload(self.store.backend().as_ref(), &self.state, &self.observers)?;
        let state = self.state();

        tracing::debug!(
            manager_id = %self.id,
            status = %state.status(),
            "Refreshed session"
        );

        Ok(state)
    }

    pub fn login(&self) -> Result<()> {
        self.commit(
            &[
                Mutation::set(keys::LOGGED_IN, flag_value(true)),
                Mutation::set(keys::GUEST, flag_value(false)),
                Mutation::remove(keys::REGISTRATION_STEP),
                Mutation::remove(keys::PENDING_ACTION),
            ],
            |state| {
                *state = SessionState::from_flags(PersistedFlags {
                    logged_in: true,
                    ..Default::default()
                });
            },
        )?;

        tracing::info!(manager_id = %self.id, "Logged in");
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.commit(
            &[
                Mutation::set(keys::LOGGED_IN, flag_value(false)),
                Mutation::set(keys::GUEST, flag_value(false)),
                Mutation::remove(keys::REGISTRATION_STEP),
                Mutation::remove(keys::PENDING_ACTION),
            ],
            |state| *state = SessionState::from_flags(PersistedFlags::default()),
        )?;

        tracing::info!(manager_id = %self.id, "Logged out");
        Ok(())
    }

    /// Browse as a guest. An in-progress registration is kept so it can be resumed.
    pub fn continue_as_guest(&self) -> Result<()> {
        self.commit(
            &[
                Mutation::set(keys::GUEST, flag_value(true)),
                Mutation::set(keys::LOGGED_IN, flag_value(false)),
            ],
            |state| {
                let mut flags = state.flags();
                flags.logged_in = false;
                flags.guest = true;
                *state = SessionState::from_flags(flags);
            },
        )?;

        tracing::info!(manager_id = %self.id, "Continuing as guest");
        Ok(())
    }

    /// Begin the registration flow at the first step and navigate to its entry point.
    ///
    /// `pending_action` is where to go once registration completes. When it is
    /// `None` (or empty) any previously stored target is left in place.
    /// Returns the registration entry point navigated to.
    pub fn start_registration(&self, pending_action: Option<&str>) -> Result<String> {
        let step = RegistrationStep::Basic;
        let pending_action = pending_action.filter(|action| !action.is_empty());

        let mut mutations = vec![Mutation::set(keys::REGISTRATION_STEP, step.as_str())];
        if let Some(action) = pending_action {
            mutations.push(Mutation::set(keys::PENDING_ACTION, action));
        }

        self.commit(&mutations, |state| {
            state.set_registration_step(Some(step));
            if let Some(action) = pending_action {
                state.set_pending_action(Some(action.to_string()));
            }
        })?;

        let entry = self.routes.registration_entry(step.as_str());
        self.navigator.navigate(&entry)?;

        tracing::info!(
            manager_id = %self.id,
            pending_action = ?pending_action,
            "Started registration"
        );

        Ok(entry)
    }

    /// Set the registration step directly, without checking the sequence.
    pub fn update_registration_step(&self, step: RegistrationStep) -> Result<()> {
        self.commit(
            &[Mutation::set(keys::REGISTRATION_STEP, step.as_str())],
            |state| state.set_registration_step(Some(step)),
        )?;

        tracing::info!(manager_id = %self.id, step = %step, "Registration step updated");
        Ok(())
    }

    /// Move the registration flow to `step`, refusing to skip ahead.
    pub fn move_registration_to(&self, step: RegistrationStep) -> Result<()> {
        let current = self
            .state
            .read()
            .registration_step()
            .ok_or(SessionError::NoRegistrationInProgress)?;

        if !current.can_advance_to(step) {
            return Err(SessionError::InvalidStepTransition {
                from: current,
                to: step,
            });
        }

        self.update_registration_step(step)
    }

    /// Move the registration flow to the step after the current one.
    pub fn advance_registration(&self) -> Result<RegistrationStep> {
        let current = self
            .state
            .read()
            .registration_step()
            .ok_or(SessionError::NoRegistrationInProgress)?;
        let next = current.next().ok_or(SessionError::RegistrationFinished)?;

        self.update_registration_step(next)?;
        Ok(next)
    }

    /// Finish registration: log in and navigate to the pending target, or the
    /// default destination when nothing was pending. Returns the target.
    pub fn complete_registration(&self) -> Result<String> {
        // Read before login, which removes it
        let pending_action = self.store.pending_action()?;

        self.login()?;

        let target = pending_action
            .filter(|action| !action.trim().is_empty())
            .unwrap_or_else(|| self.routes.default_destination().to_string());
        self.navigator.navigate(&target)?;

        tracing::info!(manager_id = %self.id, destination = %target, "Completed registration");
        Ok(target)
    }

    /// Register a callback run with the new state whenever this manager's state changes.
    pub fn on_change<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let id = ObserverId(self.observers.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.entries.write().push((id, Arc::new(observer)));
        id
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut entries = self.observers.entries.write();
        let before = entries.len();
        entries.retain(|(observer_id, _)| *observer_id != id);
        entries.len() != before
    }

    /// Write to the store, update memory, then broadcast.
    fn commit<F>(&self, mutations: &[Mutation], update: F) -> Result<()>
    where
        F: FnOnce(&mut SessionState),
    {
        self.store.apply(mutations)?;
        replace_state(&self.state, &self.observers, update);
        self.store.broadcast();
        Ok(())
    }
}

/// Apply `update` and notify observers if anything changed. No lock is held while they run.
fn replace_state<F>(state: &RwLock<SessionState>, observers: &Observers, update: F)
where
    F: FnOnce(&mut SessionState),
{
    let changed = {
        let mut guard = state.write();
        let before = guard.clone();
        update(&mut *guard);
        if *guard != before {
            Some(guard.clone())
        } else {
            None
        }
    };

    if let Some(new_state) = changed {
        observers.notify(&new_state);
    }
}

fn reload(
    backend: &dyn KeyValueStore,
    state: &RwLock<SessionState>,
    observers: &Observers,
) -> Result<()> {
    let flags = read_flags(backend)?;
    replace_state(state, observers, |state| *state = SessionState::from_flags(flags));
    Ok(())
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            state: Arc::clone(&self.state),
            observers: Arc::clone(&self.observers),
            store: self.store.clone(),
            navigator: Arc::clone(&self.navigator),
            routes: self.routes.clone(),
            _subscription: Arc::clone(&self._subscription),
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("id", &self.id)
            .field("state", &*self.state.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionStatus;
    use bazaar_navigation::RecordingNavigator;
    use bazaar_storage::{Database, MemoryStore};

    fn manager_with(backend: MemoryStore) -> (SessionManager, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::new());
        let manager = SessionManager::new(
            SessionStore::new(backend),
            navigator.clone(),
            Routes::default(),
        );
        (manager, navigator)
    }

    #[test]
    fn test_starts_loading_until_refresh() {
        let (manager, _) = manager_with(MemoryStore::new());
        assert_eq!(manager.state().status(), SessionStatus::Loading);

        let state = manager.refresh().unwrap();
        assert_eq!(state.status(), SessionStatus::Unauthenticated);
    }

    #[test]
    fn test_refresh_prefers_authenticated() {
        let backend = MemoryStore::new();
        backend.set(keys::LOGGED_IN, "true").unwrap();
        backend.set(keys::GUEST, "true").unwrap();

        let (manager, _) = manager_with(backend);
        let state = manager.refresh().unwrap();
        assert_eq!(state.status(), SessionStatus::Authenticated);
        assert!(!state.is_guest());
    }

    #[test]
    fn test_login_clears_registration() {
        let backend = MemoryStore::new();
        let (manager, _) = manager_with(backend.clone());
        manager.refresh().unwrap();

        manager.start_registration(Some("/calendar")).unwrap();
        manager.update_registration_step(RegistrationStep::Verification).unwrap();
        manager.login().unwrap();

        let state = manager.state();
        assert_eq!(state.status(), SessionStatus::Authenticated);
        assert_eq!(state.registration_step(), None);
        assert_eq!(state.pending_action(), None);
        assert_eq!(backend.get(keys::LOGGED_IN).unwrap().as_deref(), Some("true"));
        assert_eq!(backend.get(keys::GUEST).unwrap().as_deref(), Some("false"));
        assert_eq!(backend.get(keys::REGISTRATION_STEP).unwrap(), None);
        assert_eq!(backend.get(keys::PENDING_ACTION).unwrap(), None);
    }

    #[test]
    fn test_guest_keeps_registration() {
        let (manager, _) = manager_with(MemoryStore::new());
        manager.refresh().unwrap();

        manager.start_registration(Some("/services")).unwrap();
        manager.continue_as_guest().unwrap();

        let state = manager.state();
        assert_eq!(state.status(), SessionStatus::Guest);
        assert_eq!(state.registration_step(), Some(RegistrationStep::Basic));
        assert_eq!(state.pending_action(), Some("/services"));
    }

    #[test]
    fn test_start_registration_navigates_and_keeps_status() {
        let (manager, navigator) = manager_with(MemoryStore::new());
        manager.refresh().unwrap();
        manager.continue_as_guest().unwrap();

        let entry = manager.start_registration(None).unwrap();
        assert_eq!(entry, "/register?step=basic");
        assert_eq!(navigator.last().as_deref(), Some("/register?step=basic"));

        let state = manager.state();
        assert_eq!(state.status(), SessionStatus::Guest);
        assert_eq!(state.registration_step(), Some(RegistrationStep::Basic));
        assert_eq!(state.pending_action(), None);
    }

    #[test]
    fn test_start_registration_without_target_keeps_previous_target() {
        let (manager, navigator) = manager_with(MemoryStore::new());
        manager.refresh().unwrap();

        manager.start_registration(Some("/wallet")).unwrap();
        manager.start_registration(None).unwrap();
        manager.start_registration(Some("")).unwrap();

        assert_eq!(manager.state().pending_action(), Some("/wallet"));
        assert_eq!(manager.complete_registration().unwrap(), "/wallet");
        assert_eq!(navigator.navigations().len(), 4);
    }

    #[test]
    fn test_update_step_is_unchecked() {
        let (manager, _) = manager_with(MemoryStore::new());
        manager.refresh().unwrap();

        // No flow started and a skipped sequence are both accepted
        manager.update_registration_step(RegistrationStep::Complete).unwrap();
        assert_eq!(manager.state().registration_step(), Some(RegistrationStep::Complete));

        manager.update_registration_step(RegistrationStep::Contact).unwrap();
        assert_eq!(manager.state().registration_step(), Some(RegistrationStep::Contact));
    }

    #[test]
    fn test_move_registration_rejects_skips() {
        let (manager, _) = manager_with(MemoryStore::new());
        manager.refresh().unwrap();

        let err = manager.move_registration_to(RegistrationStep::Contact).unwrap_err();
        assert!(matches!(err, SessionError::NoRegistrationInProgress));

        manager.start_registration(None).unwrap();
        let err = manager.move_registration_to(RegistrationStep::Verification).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidStepTransition {
                from: RegistrationStep::Basic,
                to: RegistrationStep::Verification,
            }
        ));

        manager.move_registration_to(RegistrationStep::Contact).unwrap();
        manager.move_registration_to(RegistrationStep::Basic).unwrap();
        assert_eq!(manager.state().registration_step(), Some(RegistrationStep::Basic));
    }

    #[test]
    fn test_advance_through_every_step() {
        let (manager, _) = manager_with(MemoryStore::new());
        manager.refresh().unwrap();
        manager.start_registration(None).unwrap();

        assert_eq!(manager.advance_registration().unwrap(), RegistrationStep::Contact);
        assert_eq!(manager.advance_registration().unwrap(), RegistrationStep::Verification);
        assert_eq!(manager.advance_registration().unwrap(), RegistrationStep::Complete);
        assert!(matches!(
            manager.advance_registration().unwrap_err(),
            SessionError::RegistrationFinished
        ));
    }

    #[test]
    fn test_complete_registration_default_destination() {
        let (manager, navigator) = manager_with(MemoryStore::new());
        manager.refresh().unwrap();

        manager.start_registration(None).unwrap();
        let target = manager.complete_registration().unwrap();

        assert_eq!(target, "/");
        assert_eq!(navigator.last().as_deref(), Some("/"));
        assert!(manager.is_logged_in());
    }

    #[test]
    fn test_custom_routes() {
        let navigator = Arc::new(RecordingNavigator::new());
        let manager = SessionManager::open(
            SessionStore::new(MemoryStore::new()),
            navigator.clone(),
            Routes::new("/en/sign-up", "/en/dashboard"),
        )
        .unwrap();

        manager.start_registration(None).unwrap();
        manager.complete_registration().unwrap();

        assert_eq!(
            navigator.navigations(),
            vec!["/en/sign-up?step=basic", "/en/dashboard"]
        );
    }

    #[test]
    fn test_observers_see_changes_once() {
        let (manager, _) = manager_with(MemoryStore::new());
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let id = {
            let seen = Arc::clone(&seen);
            manager.on_change(move |state| seen.lock().push(state.status()))
        };

        manager.refresh().unwrap();
        manager.refresh().unwrap();
        manager.continue_as_guest().unwrap();
        manager.login().unwrap();

        assert_eq!(
            *seen.lock(),
            vec![
                SessionStatus::Unauthenticated,
                SessionStatus::Guest,
                SessionStatus::Authenticated,
            ]
        );

        assert!(manager.remove_observer(id));
        assert!(!manager.remove_observer(id));
        manager.logout().unwrap();
        assert_eq!(seen.lock().len(), 3);
    }

    #[test]
    fn test_observer_can_read_manager() {
        let (manager, _) = manager_with(MemoryStore::new());
        let reader = manager.clone();
        let seen = Arc::new(parking_lot::Mutex::new(None));

        {
            let seen = Arc::clone(&seen);
            manager.on_change(move |_| *seen.lock() = Some(reader.is_guest()));
        }

        manager.continue_as_guest().unwrap();
        assert_eq!(*seen.lock(), Some(true));
    }

    #[test]
    fn test_subscription_released_with_last_clone() {
        let store = SessionStore::new(MemoryStore::new());
        let manager = SessionManager::new(
            store.clone(),
            Arc::new(RecordingNavigator::new()),
            Routes::default(),
        );
        let clone = manager.clone();
        assert_eq!(store.subscriber_count(), 1);

        drop(manager);
        assert_eq!(store.subscriber_count(), 1);

        drop(clone);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_blank_pending_action_uses_default_destination() {
        let (manager, navigator) = manager_with(MemoryStore::new());
        manager.refresh().unwrap();
        manager.start_registration(None).unwrap();

        manager.store.apply(&[Mutation::set(keys::PENDING_ACTION, "   ")]).unwrap();
        assert_eq!(manager.complete_registration().unwrap(), "/");
        assert_eq!(navigator.last().as_deref(), Some("/"));
    }

    #[test]
    fn test_works_over_sqlite() {
        let db = Database::open_in_memory().unwrap();
        let manager = SessionManager::open(
            SessionStore::new(db.clone()),
            Arc::new(RecordingNavigator::new()),
            Routes::default(),
        )
        .unwrap();

        manager.start_registration(Some("/wallet")).unwrap();
        assert_eq!(db.get(keys::REGISTRATION_STEP).unwrap().as_deref(), Some("basic"));

        manager.complete_registration().unwrap();
        assert_eq!(db.get(keys::PENDING_ACTION).unwrap(), None);
        assert_eq!(db.get(keys::LOGGED_IN).unwrap().as_deref(), Some("true"));
    }
}
