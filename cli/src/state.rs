//! Command state
use bazaar_core::{App, Config, Result, SessionManager};

pub struct AppState {
    app: App,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            app: App::new(config)?,
        })
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Ok(Self {
            app: App::open_in_memory(config)?,
        })
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Run `f` against a freshly loaded view of the session
    pub fn with_view<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&SessionManager) -> Result<T>,
    {
        let view = self.app.open_view()?;
        f(&view)
    }
}
