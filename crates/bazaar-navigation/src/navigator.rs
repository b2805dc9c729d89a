//! Navigation port

use parking_lot::Mutex;

use crate::error::NavigationError;
use crate::Result;

/// Something that can move the client to another page.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str) -> Result<()>;
}

/// Reject targets a router could never resolve.
pub(crate) fn check_target(target: &str) -> Result<()> {
    if target.trim().is_empty() {
        return Err(NavigationError::InvalidTarget(target.to_string()));
    }
    Ok(())
}

/// Keeps every requested target in memory, oldest first.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    targets: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.targets.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.targets.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) -> Result<()> {
        check_target(target)?;
        self.targets.lock().push(target.to_string());
        tracing::debug!(target_path = %target, "Navigation requested");
        Ok(())
    }
}
