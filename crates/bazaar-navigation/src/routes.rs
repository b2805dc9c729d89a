//! Route building for the registration flow

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

pub const DEFAULT_REGISTRATION_PATH: &str = "/register";
pub const DEFAULT_DESTINATION: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routes {
    /// Entry point of the registration flow
    pub registration_path: String,
    /// Where a finished registration lands when nothing was pending
    pub default_destination: String,
}

impl Routes {
    pub fn new(registration_path: impl Into<String>, default_destination: impl Into<String>) -> Self {
        Self {
            registration_path: registration_path.into(),
            default_destination: default_destination.into(),
        }
    }

    /// Registration entry point carrying the step, e.g. `/register?step=basic`.
    pub fn registration_entry(&self, step: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("step", step)
            .finish();

        let separator = if self.registration_path.contains('?') {
            '&'
        } else {
            '?'
        };

        format!("{}{}{}", self.registration_path, separator, query)
    }

    pub fn default_destination(&self) -> &str {
        &self.default_destination
    }
}

impl Default for Routes {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRATION_PATH, DEFAULT_DESTINATION)
    }
}
