//! Per-user critical sections around device set read-modify-write sequences.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use kindred_cache::keys;
use kindred_core::config::DeviceLockConfig;
use kindred_core::error::AppError;
use kindred_core::result::AppResult;
use kindred_core::traits::cache::CacheProvider;

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Hands out exclusive access to one user's device set at a time.
///
/// Always serializes tasks of this process through a keyed mutex. When the
/// lease is enabled it additionally takes a cache lease so that other
/// processes sharing the cache are excluded too. Different users never
/// contend.
#[derive(Debug)]
pub struct DeviceSetLocks {
    /// User ID → mutex. An entry lives only while some task holds or awaits it.
    local: Arc<LockMap>,
    /// Cache used for leases.
    cache: Arc<dyn CacheProvider>,
    /// Lease settings.
    config: DeviceLockConfig,
}

impl DeviceSetLocks {
    /// Creates the lock table.
    pub fn new(cache: Arc<dyn CacheProvider>, config: DeviceLockConfig) -> Self {
        Self {
            local: Arc::new(DashMap::new()),
            cache,
            config,
        }
    }

    /// Number of users with a live in-process lock entry.
    #[cfg(test)]
    pub(crate) fn active_users(&self) -> usize {
        self.local.len()
    }

    /// Waits for exclusive access to `user_id`'s device set.
    ///
    /// Fails with `StoreUnavailable` if the cache lease cannot be taken
    /// within the configured timeout.
    pub async fn acquire(&self, user_id: &str) -> AppResult<DeviceSetGuard> {
        let local = self.acquire_local(user_id).await;

        let lease = if self.config.enabled {
            Some(Arc::new(self.acquire_lease(user_id).await?))
        } else {
            None
        };

        Ok(DeviceSetGuard {
            _local: local,
            lease,
        })
    }

    async fn acquire_local(&self, user_id: &str) -> LocalGuard {
        let mutex = self
            .local
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();

        let guard = mutex.lock_owned().await;
        LocalGuard {
            user_id: user_id.to_string(),
            guard: Some(guard),
            table: Arc::clone(&self.local),
        }
    }

    async fn acquire_lease(&self, user_id: &str) -> AppResult<Lease> {
        let key = keys::user_devices_lock(user_id);
        let token = Uuid::new_v4().to_string();
        let deadline = Instant::now() + self.config.acquire_timeout();

        loop {
            if self.cache.set_nx(&key, &token, self.config.lease()).await? {
                debug!(user_id = %user_id, "Device set lease acquired");
                return Ok(Lease {
                    key,
                    token,
                    ttl: self.config.lease(),
                    cache: Arc::clone(&self.cache),
                });
            }

            if Instant::now() >= deadline {
                warn!(
                    user_id = %user_id,
                    timeout_ms = self.config.acquire_timeout_ms,
                    "Timed out waiting for device set lease"
                );
                return Err(AppError::store_unavailable(format!(
                    "Timed out waiting for the device set lock of user '{user_id}'"
                )));
            }

            tokio::time::sleep(self.config.retry_interval()).await;
        }
    }
}

/// Exclusive access to one user's device set.
///
/// Call [`DeviceSetGuard::release`] when done so the cache lease is freed
/// promptly. If the guard is dropped instead, the in-process lock is freed
/// immediately and the lease lapses after its TTL.
#[derive(Debug)]
pub struct DeviceSetGuard {
    _local: LocalGuard,
    lease: Option<Arc<Lease>>,
}

impl DeviceSetGuard {
    /// A handle the locked section uses to re-check the lease before writing.
    pub fn lease_check(&self) -> LeaseCheck {
        LeaseCheck {
            lease: self.lease.clone(),
        }
    }

    /// Releases the lease (if any) and then the in-process lock.
    pub async fn release(self) {
        if let Some(lease) = &self.lease {
            lease.release().await;
        }
    }
}

/// Confirms a held lease is still ours and pushes its expiry out.
///
/// A no-op when leases are disabled.
#[derive(Debug, Clone, Default)]
pub struct LeaseCheck {
    lease: Option<Arc<Lease>>,
}

impl LeaseCheck {
    /// Renews the lease for another full TTL.
    ///
    /// Fails with `StoreUnavailable` if the lease lapsed or another owner
    /// holds it; nothing may be written after that.
    pub async fn confirm(&self) -> AppResult<()> {
        let Some(lease) = &self.lease else {
            return Ok(());
        };

        if lease.renew().await? {
            return Ok(());
        }

        warn!(key = %lease.key, "Device set lease lost before write");
        Err(AppError::store_unavailable(format!(
            "Lost the device set lock '{}' before writing",
            lease.key
        )))
    }
}

/// Holds a user's in-process mutex and prunes the table on drop.
#[derive(Debug)]
struct LocalGuard {
    user_id: String,
    guard: Option<OwnedMutexGuard<()>>,
    table: Arc<LockMap>,
}

impl Drop for LocalGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Only the table's own reference left: nobody holds or waits.
        self.table
            .remove_if(&self.user_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// A cache lease identified by a random owner token.
#[derive(Debug)]
struct Lease {
    key: String,
    token: String,
    ttl: Duration,
    cache: Arc<dyn CacheProvider>,
}

impl Lease {
    async fn renew(&self) -> AppResult<bool> {
        self.cache
            .expire_if_equals(&self.key, &self.token, self.ttl)
            .await
    }

    async fn release(&self) {
        match self.cache.delete_if_equals(&self.key, &self.token).await {
            Ok(true) => debug!(key = %self.key, "Device set lease released"),
            Ok(false) => warn!(key = %self.key, "Device set lease had already lapsed"),
            Err(e) => warn!(key = %self.key, error = %e, "Failed to release device set lease"),
        }
    }
}
