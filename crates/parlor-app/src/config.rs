use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Fixed delays that stand in for network latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatTimings {
    pub reply_delay: Duration,
    /// Minimum gap between two delivered replies.
    pub reply_throttle: Duration,
    pub load_delay: Duration,
    pub page_delay: Duration,
    pub send_code_delay: Duration,
    pub verify_delay: Duration,
    pub search_debounce: Duration,
}

impl Default for ChatTimings {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(2000),
            reply_throttle: Duration::from_millis(4000),
            load_delay: Duration::from_millis(500),
            page_delay: Duration::from_millis(1000),
            send_code_delay: Duration::from_millis(1500),
            verify_delay: Duration::from_millis(2000),
            search_debounce: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatLimits {
    pub page_size: usize,
    /// Pagination stops once a conversation holds this many messages.
    pub max_messages: usize,
    pub seed_count: usize,
}

impl Default for ChatLimits {
    fn default() -> Self {
        Self {
            page_size: 20,
            max_messages: 100,
            seed_count: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    Memory,
    Sqlite(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage: StorageLocation,
    /// Drop a partner's stored conversation when the partner is deleted.
    pub purge_on_delete: bool,
    pub timings: ChatTimings,
    pub limits: ChatLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageLocation::Sqlite(PathBuf::from("parlor.db")),
            purge_on_delete: false,
            timings: ChatTimings::default(),
            limits: ChatLimits::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let t = defaults.timings;
        let l = defaults.limits;

        let storage = match lookup("PARLOR_DB_PATH").as_deref() {
            Some(":memory:") => StorageLocation::Memory,
            Some(path) if !path.is_empty() => StorageLocation::Sqlite(PathBuf::from(path)),
            _ => defaults.storage,
        };

        let millis = |name: &str, default: Duration| -> Result<Duration> {
            Ok(Duration::from_millis(parse_var(&lookup, name, default.as_millis() as u64)?))
        };

        Ok(Self {
            storage,
            purge_on_delete: parse_var(&lookup, "PARLOR_PURGE_ON_DELETE", defaults.purge_on_delete)?,
            timings: ChatTimings {
                reply_delay: millis("PARLOR_REPLY_DELAY_MS", t.reply_delay)?,
                reply_throttle: millis("PARLOR_REPLY_THROTTLE_MS", t.reply_throttle)?,
                load_delay: millis("PARLOR_LOAD_DELAY_MS", t.load_delay)?,
                page_delay: millis("PARLOR_PAGE_DELAY_MS", t.page_delay)?,
                send_code_delay: millis("PARLOR_SEND_CODE_DELAY_MS", t.send_code_delay)?,
                verify_delay: millis("PARLOR_VERIFY_DELAY_MS", t.verify_delay)?,
                search_debounce: millis("PARLOR_SEARCH_DEBOUNCE_MS", t.search_debounce)?,
            },
            limits: ChatLimits {
                page_size: parse_var(&lookup, "PARLOR_PAGE_SIZE", l.page_size)?,
                max_messages: parse_var(&lookup, "PARLOR_MAX_MESSAGES", l.max_messages)?,
                seed_count: parse_var(&lookup, "PARLOR_SEED_COUNT", l.seed_count)?,
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", name, raw)),
        None => Ok(default),
    }
}
