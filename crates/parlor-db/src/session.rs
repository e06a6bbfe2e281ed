use anyhow::Result;
use tracing::warn;

use crate::SharedStore;

pub const SESSION_KEY: &str = "isAuthenticated";

/// The persisted session flag: `"true"` or absent.
#[derive(Clone)]
pub struct SessionRecord {
    kv: SharedStore,
}

impl SessionRecord {
    pub fn new(kv: SharedStore) -> Self {
        Self { kv }
    }

    /// Any value other than exactly `"true"` reads as signed out.
    pub fn is_set(&self) -> bool {
        match self.kv.get(SESSION_KEY) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(e) => {
                warn!("Failed to read session flag: {:#}", e);
                false
            }
        }
    }

    pub fn set(&self) -> Result<()> {
        self.kv.set(SESSION_KEY, "true")
    }

    pub fn clear(&self) -> Result<()> {
        self.kv.remove(SESSION_KEY)
    }
}
