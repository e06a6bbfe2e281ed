use tracing::info;

use parlor_db::{SessionRecord, SharedStore};
use parlor_types::api::Route;

use crate::error::Result;

/// Explicit session context handed to the router.
///
/// Purely presentational: the flag lives in local storage and nothing
/// verifies it. There is no expiry and no refresh.
#[derive(Clone)]
pub struct SessionGate {
    record: SessionRecord,
}

impl SessionGate {
    pub fn new(kv: SharedStore) -> Self {
        Self {
            record: SessionRecord::new(kv),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.record.is_set()
    }

    pub fn sign_in(&self) -> Result<()> {
        self.record.set()?;
        info!("Session started");
        Ok(())
    }

    pub fn sign_out(&self) -> Result<()> {
        self.record.clear()?;
        info!("Session cleared");
        Ok(())
    }

    /// Where a request for `route` actually lands.
    pub fn resolve(&self, route: Route) -> Route {
        match (route, self.is_authenticated()) {
            (Route::Dashboard, false) => Route::Landing,
            (Route::Landing, true) => Route::Dashboard,
            (route, _) => route,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parlor_db::MemoryStore;

    use super::*;

    #[test]
    fn dashboard_requires_session() {
        let gate = SessionGate::new(Arc::new(MemoryStore::new()));
        assert_eq!(gate.resolve(Route::Dashboard), Route::Landing);
        assert_eq!(gate.resolve(Route::Landing), Route::Landing);
    }

    #[test]
    fn signed_in_users_skip_landing() {
        let gate = SessionGate::new(Arc::new(MemoryStore::new()));
        gate.sign_in().unwrap();
        assert_eq!(gate.resolve(Route::Landing), Route::Dashboard);
        assert_eq!(gate.resolve(Route::Dashboard), Route::Dashboard);

        gate.sign_out().unwrap();
        assert!(!gate.is_authenticated());
        assert_eq!(gate.resolve(Route::Dashboard), Route::Landing);
    }
}
