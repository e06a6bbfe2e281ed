use anyhow::{Context, Result};
use tracing::{debug, warn};

use parlor_types::models::Message;

use crate::SharedStore;

pub const CHAT_KEY_PREFIX: &str = "chat_messages_";

/// Outcome of reading one conversation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Absent,
    Loaded(Vec<Message>),
    /// Present but failed to read or parse. Left as is until the next save.
    Unreadable,
}

impl Record {
    pub fn into_messages(self) -> Vec<Message> {
        match self {
            Self::Loaded(messages) => messages,
            Self::Absent | Self::Unreadable => Vec::new(),
        }
    }
}

/// Per-partner conversation records, one JSON array per key.
///
/// Writes replace the whole record. A record that fails to read or parse is
/// treated as empty history and left untouched until the next save.
#[derive(Clone)]
pub struct MessageStore {
    kv: SharedStore,
}

impl MessageStore {
    pub fn new(kv: SharedStore) -> Self {
        Self { kv }
    }

    pub fn key_for(partner: &str) -> String {
        format!("{}{}", CHAT_KEY_PREFIX, partner)
    }

    /// Read a conversation record, telling a missing record apart from one
    /// that could not be read or parsed. Only one read is made.
    pub fn fetch(&self, partner: &str) -> Record {
        let key = Self::key_for(partner);
        let raw = match self.kv.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Record::Absent,
            Err(e) => {
                warn!("Failed to read {}: {:#}", key, e);
                return Record::Unreadable;
            }
        };

        match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(messages) => {
                debug!("Loaded {} messages from {}", messages.len(), key);
                Record::Loaded(messages)
            }
            Err(e) => {
                warn!("Corrupt conversation record {}, treating as empty: {}", key, e);
                Record::Unreadable
            }
        }
    }

    /// Load a conversation, oldest first. Absent or unreadable records are empty.
    pub fn load(&self, partner: &str) -> Vec<Message> {
        self.fetch(partner).into_messages()
    }

    pub fn save(&self, partner: &str, messages: &[Message]) -> Result<()> {
        let key = Self::key_for(partner);
        let json = serde_json::to_string(messages)
            .with_context(|| format!("failed to serialize {}", key))?;
        self.kv
            .set(&key, &json)
            .with_context(|| format!("failed to write {}", key))?;
        debug!("Saved {} messages to {}", messages.len(), key);
        Ok(())
    }

    pub fn remove(&self, partner: &str) -> Result<()> {
        self.kv.remove(&Self::key_for(partner))
    }

    /// Partners that have a stored record.
    pub fn partners(&self) -> Result<Vec<String>> {
        Ok(self
            .kv
            .keys_with_prefix(CHAT_KEY_PREFIX)?
            .into_iter()
            .filter_map(|k| k.strip_prefix(CHAT_KEY_PREFIX).map(str::to_string))
            .collect())
    }
}
