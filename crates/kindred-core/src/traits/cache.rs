//! Cache provider trait for pluggable caching backends.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for cache backends (Redis or in-memory).
///
/// Keys hold either a plain string (used for leases) or a hash of
/// field → string. Hash values are JSON documents owned by the caller. The
/// provider is responsible for key prefixing and TTL enforcement; every
/// backend failure is reported as `ErrorKind::StoreUnavailable`.
#[async_trait]
pub trait CacheProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Get every field of a hash. Returns an empty map when the key does not
    /// exist or has expired.
    async fn hget_all(&self, key: &str) -> AppResult<HashMap<String, String>>;

    /// Get a single hash field.
    async fn hget(&self, key: &str, field: &str) -> AppResult<Option<String>>;

    /// Set a single hash field, creating the hash if needed.
    ///
    /// An existing TTL on the key is preserved; a newly created key has none.
    async fn hset(&self, key: &str, field: &str, value: &str) -> AppResult<()>;

    /// Delete a single hash field. Returns `true` if the field existed.
    async fn hdel(&self, key: &str, field: &str) -> AppResult<bool>;

    /// Set the TTL on an existing key. Returns `false` if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool>;

    /// Remaining TTL of a key, or `None` if the key is absent or persistent.
    async fn ttl(&self, key: &str) -> AppResult<Option<Duration>>;

    /// Delete a key from the cache.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Set a string value only if the key does not already exist (NX).
    /// Returns `true` if the value was set, `false` if the key already existed.
    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool>;

    /// Delete a string key only if it still holds `expected`.
    /// Returns `true` if the key was deleted.
    async fn delete_if_equals(&self, key: &str, expected: &str) -> AppResult<bool>;

    /// Reset the TTL of a string key only if it still holds `expected`.
    /// Returns `true` if the key held `expected` and its TTL was reset.
    async fn expire_if_equals(&self, key: &str, expected: &str, ttl: Duration) -> AppResult<bool>;

    /// Check that the cache backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
