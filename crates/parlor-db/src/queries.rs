use crate::models::KvRow;
use crate::{Database, KeyValueStore};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    pub fn get_row(&self, key: &str) -> Result<Option<KvRow>> {
        self.with_conn(|conn| query_row_by_key(conn, key))
    }

    /// Insert or overwrite a value.
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
                (key, value),
            )?;
            Ok(())
        })
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
            Ok(())
        })
    }

    pub fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        // substr instead of LIKE: keys contain `_`, which LIKE treats as a wildcard
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT key FROM kv_store WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
            )?;
            let keys = stmt
                .query_map([prefix], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(keys)
        })
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get_row(key)?.map(|row| row.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.put(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.delete(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.list_keys(prefix)
    }
}

fn query_row_by_key(conn: &Connection, key: &str) -> Result<Option<KvRow>> {
    let mut stmt = conn.prepare("SELECT key, value, updated_at FROM kv_store WHERE key = ?1")?;

    let row = stmt
        .query_row([key], |row| {
            Ok(KvRow {
                key: row.get(0)?,
                value: row.get(1)?,
                updated_at: row.get(2)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_overwrites_value() {
        let db = Database::open_in_memory().unwrap();
        db.put("isAuthenticated", "true").unwrap();
        db.put("isAuthenticated", "false").unwrap();

        let row = db.get_row("isAuthenticated").unwrap().unwrap();
        assert_eq!(row.key, "isAuthenticated");
        assert_eq!(row.value, "false");
        assert!(!row.updated_at.is_empty());
    }

    #[test]
    fn missing_key_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get("nope").unwrap().is_none());
    }

    #[test]
    fn prefix_listing_treats_underscore_literally() {
        let db = Database::open_in_memory().unwrap();
        db.put("chat_messages_Bob", "[]").unwrap();
        db.put("chat_messages_Alice", "[]").unwrap();
        db.put("chatXmessagesXCarol", "[]").unwrap();
        db.put("isAuthenticated", "true").unwrap();

        let keys = db.keys_with_prefix("chat_messages_").unwrap();
        assert_eq!(keys, vec!["chat_messages_Alice", "chat_messages_Bob"]);
    }

    #[test]
    fn delete_removes_key() {
        let db = Database::open_in_memory().unwrap();
        db.put("k", "v").unwrap();
        db.remove("k").unwrap();
        assert!(db.get("k").unwrap().is_none());
        // deleting again is a no-op
        db.remove("k").unwrap();
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parlor.db");
        {
            let db = Database::open(&path).unwrap();
            db.put("chat_messages_Alice", "[]").unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get("chat_messages_Alice").unwrap().as_deref(), Some("[]"));
    }
}
