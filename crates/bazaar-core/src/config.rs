//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use bazaar_navigation::Routes;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the durable store
    pub database_path: PathBuf,
    /// Entry point of the registration flow
    pub registration_path: String,
    /// Landing page after registration when nothing was pending
    pub default_destination: String,
    /// Persist every navigation to the store's history table
    pub record_navigation: bool,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        let routes = Routes::default();

        Self {
            database_path: data_dir.join("bazaar.db"),
            registration_path: routes.registration_path,
            default_destination: routes.default_destination,
            record_navigation: true,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("bazaar"))
            .unwrap_or_else(|| PathBuf::from(".bazaar"))
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;

        tracing::debug!(path = %path.as_ref().display(), "Loaded configuration");
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("registration_path", &self.registration_path),
            ("default_destination", &self.default_destination),
        ] {
            if !value.starts_with('/') {
                return Err(CoreError::Config(format!(
                    "{} must be an absolute path, got {:?}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn routes(&self) -> Routes {
        Routes::new(
            self.registration_path.clone(),
            self.default_destination.clone(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
