//! Local persistence for Parlor.
//!
//! Everything is a flat string key mapped to a string value, the same shape a
//! browser's `localStorage` has. [`Database`] keeps that map in SQLite,
//! [`MemoryStore`] keeps it in a `BTreeMap`. The typed stores on top
//! ([`MessageStore`], [`SessionRecord`]) only ever talk to the trait.

pub mod memory;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod session;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

pub use memory::MemoryStore;
pub use messages::{MessageStore, Record};
pub use session::SessionRecord;

/// Flat key-value storage with full-overwrite writes.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    /// All keys starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

pub type SharedStore = Arc<dyn KeyValueStore>;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }
}
