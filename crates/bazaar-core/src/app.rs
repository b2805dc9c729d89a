//! Application container
//!
//! Owns the durable store and the navigator. Every view of the app gets its
//! own `SessionManager`, all sharing one `SessionStore`.

use std::sync::Arc;

use bazaar_navigation::{HistoryEntry, HistoryNavigator, Navigator, RecordingNavigator};
use bazaar_session::{SessionManager, SessionStore};
use bazaar_storage::Database;

use crate::config::Config;
use crate::Result;

pub struct App {
    config: Config,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    /// Present when navigations are persisted
    history: Option<HistoryNavigator>,
}

impl App {
    /// Open the app over the database at `config.database_path`
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;

        tracing::info!(path = %config.database_path.display(), "Opened session store");

        Ok(Self::with_database(config, db))
    }

    /// Open the app over a throwaway in-memory database
    pub fn open_in_memory(config: Config) -> Result<Self> {
        config.validate()?;
        let db = Database::open_in_memory()?;
        Ok(Self::with_database(config, db))
    }

    fn with_database(config: Config, db: Database) -> Self {
        let history = config
            .record_navigation
            .then(|| HistoryNavigator::new(db.clone()));

        let navigator: Arc<dyn Navigator> = match &history {
            Some(history) => Arc::new(history.clone()),
            None => Arc::new(RecordingNavigator::new()),
        };

        Self {
            config,
            store: SessionStore::new(db),
            navigator,
            history,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Open a new view: a session manager loaded from the store and kept in
    /// sync with every other view.
    pub fn open_view(&self) -> Result<SessionManager> {
        let manager = SessionManager::open(
            self.store.clone(),
            Arc::clone(&self.navigator),
            self.config.routes(),
        )?;

        tracing::debug!(
            manager_id = %manager.id(),
            status = %manager.state().status(),
            "Opened view"
        );

        Ok(manager)
    }

    /// Recent navigations, newest first. Empty when navigation is not recorded.
    pub fn navigation_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        match &self.history {
            Some(history) => Ok(history.recent(limit)?),
            None => Ok(Vec::new()),
        }
    }

    /// Clear every session key and tell all views.
    pub fn reset(&self) -> Result<()> {
        self.store.reset()?;
        if let Some(history) = &self.history {
            history.clear_all()?;
        }

        tracing::info!("Session store reset");
        Ok(())
    }
}
