//! Login navigation for non-browser hosts
//!
//! There is no page to move away from in a CLI or service, so the
//! navigator remembers a current location, records every redirect and
//! tells the operator to sign in again.

use mgsdb_core::LoginNavigator;
use parking_lot::RwLock;
use tracing::warn;

#[derive(Debug)]
pub struct SessionNavigator {
    location: RwLock<String>,
    redirects: RwLock<Vec<String>>,
}

impl SessionNavigator {
    pub fn new(location: impl Into<String>) -> Self {
        Self { location: RwLock::new(location.into()), redirects: RwLock::new(Vec::new()) }
    }

    pub fn set_location(&self, location: impl Into<String>) {
        *self.location.write() = location.into();
    }

    /// Login targets navigated to so far, oldest first.
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.read().clone()
    }

    pub fn last_redirect(&self) -> Option<String> {
        self.redirects.read().last().cloned()
    }
}

impl Default for SessionNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl LoginNavigator for SessionNavigator {
    fn current_location(&self) -> String {
        self.location.read().clone()
    }

    fn navigate(&self, target: &str) {
        warn!(target, "Authentication required, sign in again");
        self.redirects.write().push(target.to_string());
        *self.location.write() = target.to_string();
    }
}
