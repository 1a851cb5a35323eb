//! Cache manager that dispatches to the configured provider.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use kindred_core::config::cache::CacheConfig;
use kindred_core::error::AppError;
use kindred_core::result::AppResult;
use kindred_core::traits::cache::CacheProvider;

/// Cache manager that wraps the configured cache provider.
///
/// Every call is bounded by the configured operation timeout; a call that
/// exceeds it fails with `StoreUnavailable`.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// The inner cache provider.
    inner: Arc<dyn CacheProvider>,
    /// Upper bound on a single round-trip.
    operation_timeout: Duration,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let inner: Arc<dyn CacheProvider> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis cache provider");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisCacheProvider::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory cache provider");
                Arc::new(crate::memory::MemoryCacheProvider::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self {
            inner,
            operation_timeout: config.operation_timeout(),
        })
    }

    /// Create a cache manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn CacheProvider>, operation_timeout: Duration) -> Self {
        Self {
            inner: provider,
            operation_timeout,
        }
    }

    /// Get a reference to the inner provider.
    pub fn provider(&self) -> &dyn CacheProvider {
        self.inner.as_ref()
    }

    /// Run one provider call under the operation timeout.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = AppResult<T>> + Send,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.operation_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = self.operation_timeout.as_millis();
                warn!(operation, timeout_ms, "Cache operation timed out");
                Err(AppError::store_unavailable(format!(
                    "Cache {operation} timed out after {timeout_ms}ms"
                )))
            }
        }
    }
}

#[async_trait]
impl CacheProvider for CacheManager {
    async fn hget_all(&self, key: &str) -> AppResult<HashMap<String, String>> {
        self.bounded("HGETALL", self.inner.hget_all(key)).await
    }

    async fn hget(&self, key: &str, field: &str) -> AppResult<Option<String>> {
        self.bounded("HGET", self.inner.hget(key, field)).await
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> AppResult<()> {
        self.bounded("HSET", self.inner.hset(key, field, value))
            .await
    }

    async fn hdel(&self, key: &str, field: &str) -> AppResult<bool> {
        self.bounded("HDEL", self.inner.hdel(key, field)).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        self.bounded("EXPIRE", self.inner.expire(key, ttl)).await
    }

    async fn ttl(&self, key: &str) -> AppResult<Option<Duration>> {
        self.bounded("PTTL", self.inner.ttl(key)).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.bounded("DEL", self.inner.delete(key)).await
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        self.bounded("SET NX", self.inner.set_nx(key, value, ttl))
            .await
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> AppResult<bool> {
        self.bounded("DEL IF EQ", self.inner.delete_if_equals(key, expected))
            .await
    }

    async fn expire_if_equals(&self, key: &str, expected: &str, ttl: Duration) -> AppResult<bool> {
        self.bounded("PEXPIRE IF EQ", self.inner.expire_if_equals(key, expected, ttl))
            .await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.bounded("PING", self.inner.health_check()).await
    }
}
