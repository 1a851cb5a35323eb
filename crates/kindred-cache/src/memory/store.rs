//! In-memory cache implementation on a concurrent hash map.
//!
//! Each key records its own expiry instant, checked on every access, so
//! whole-key TTLs behave like Redis: an expired key reads as absent and is
//! dropped lazily. Instants come from `tokio::time`, which lets tests drive
//! expiry with a paused clock.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;
use tracing::debug;

use kindred_core::error::AppError;
use kindred_core::result::AppResult;
use kindred_core::traits::cache::CacheProvider;

/// Value stored under a key.
#[derive(Debug, Clone)]
enum StoredValue {
    Text(String),
    Hash(HashMap<String, String>),
}

/// A key's value plus its optional expiry.
#[derive(Debug, Clone)]
struct MemoryEntry {
    value: StoredValue,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory cache provider for single-node deployments and tests.
#[derive(Debug, Default)]
pub struct MemoryCacheProvider {
    /// Key → entry.
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryCacheProvider {
    /// Create an empty in-memory cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    /// Whether no live key exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop `key` if it has expired.
    fn purge_expired(&self, key: &str, now: Instant) {
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(now))
            .is_some()
        {
            debug!(key, "Expired key dropped");
        }
    }

    /// Run `inspect` against the live entry for `key`, if any.
    fn read<R>(&self, key: &str, inspect: impl FnOnce(&MemoryEntry) -> R) -> Option<R> {
        let now = Instant::now();
        self.purge_expired(key, now);
        self.entries.get(key).map(|entry| inspect(entry.value()))
    }

    fn wrong_type(key: &str) -> AppError {
        AppError::store_unavailable(format!(
            "WRONGTYPE operation against key '{key}' holding the wrong kind of value"
        ))
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn hget_all(&self, key: &str) -> AppResult<HashMap<String, String>> {
        match self.read(key, |entry| entry.value.clone()) {
            None => Ok(HashMap::new()),
            Some(StoredValue::Hash(fields)) => Ok(fields),
            Some(StoredValue::Text(_)) => Err(Self::wrong_type(key)),
        }
    }

    async fn hget(&self, key: &str, field: &str) -> AppResult<Option<String>> {
        let found = self.read(key, |entry| match &entry.value {
            StoredValue::Hash(fields) => Ok(fields.get(field).cloned()),
            StoredValue::Text(_) => Err(Self::wrong_type(key)),
        });
        found.unwrap_or(Ok(None))
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> AppResult<()> {
        self.purge_expired(key, Instant::now());
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| MemoryEntry {
                value: StoredValue::Hash(HashMap::new()),
                expires_at: None,
            });

        match &mut entry.value {
            StoredValue::Hash(fields) => {
                fields.insert(field.to_string(), value.to_string());
                Ok(())
            }
            StoredValue::Text(_) => Err(Self::wrong_type(key)),
        }
    }

    async fn hdel(&self, key: &str, field: &str) -> AppResult<bool> {
        self.purge_expired(key, Instant::now());
        let removed = match self.entries.get_mut(key) {
            None => false,
            Some(mut entry) => match &mut entry.value {
                StoredValue::Hash(fields) => fields.remove(field).is_some(),
                StoredValue::Text(_) => return Err(Self::wrong_type(key)),
            },
        };

        // An emptied hash disappears, as in Redis.
        self.entries.remove_if(key, |_, entry| {
            matches!(&entry.value, StoredValue::Hash(fields) if fields.is_empty())
        });

        Ok(removed)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let now = Instant::now();
        self.purge_expired(key, now);
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<Duration>> {
        let now = Instant::now();
        Ok(self
            .read(key, |entry| entry.expires_at)
            .flatten()
            .map(|at| at.saturating_duration_since(now)))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        let now = Instant::now();
        self.purge_expired(key, now);
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                vacant.insert(MemoryEntry {
                    value: StoredValue::Text(value.to_string()),
                    expires_at: Some(now + ttl),
                });
                Ok(true)
            }
        }
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> AppResult<bool> {
        let now = Instant::now();
        let removed = self.entries.remove_if(key, |_, entry| {
            !entry.is_expired(now)
                && matches!(&entry.value, StoredValue::Text(current) if current == expected)
        });
        Ok(removed.is_some())
    }

    async fn expire_if_equals(&self, key: &str, expected: &str, ttl: Duration) -> AppResult<bool> {
        let now = Instant::now();
        self.purge_expired(key, now);
        match self.entries.get_mut(key) {
            Some(mut entry) if matches!(&entry.value, StoredValue::Text(current) if current == expected) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
