//! Device session store: the per-user registry of authenticated devices.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use kindred_cache::keys;
use kindred_core::config::DeviceSessionConfig;
use kindred_core::error::AppError;
use kindred_core::result::AppResult;
use kindred_core::traits::cache::CacheProvider;
use kindred_core::traits::clock::Clock;

use super::eviction::{decode_members, select_evictions};
use super::lock::{DeviceSetLocks, LeaseCheck};
use super::session::{DeviceSession, RegisterOutcome, SessionValue};

/// Owns each user's bounded set of device sessions in the shared cache.
///
/// A user's set is one cache hash (`user:<id>:devices`) mapping device ID to
/// an encoded [`SessionValue`]. The hash carries one TTL, renewed only by
/// [`register`](Self::register). Every mutating operation runs under the
/// user's [`DeviceSetLocks`] guard, so concurrent requests for the same user
/// never interleave their read-modify-write sequences.
#[derive(Debug, Clone)]
pub struct DeviceSessionStore {
    /// Shared cache.
    cache: Arc<dyn CacheProvider>,
    /// Timestamp source for `lastAccess`.
    clock: Arc<dyn Clock>,
    /// Per-user critical sections.
    locks: Arc<DeviceSetLocks>,
    /// Capacity and expiry settings.
    config: DeviceSessionConfig,
}

impl DeviceSessionStore {
    /// Creates a new device session store.
    pub fn new(
        cache: Arc<dyn CacheProvider>,
        clock: Arc<dyn Clock>,
        config: DeviceSessionConfig,
    ) -> Self {
        let locks = Arc::new(DeviceSetLocks::new(
            Arc::clone(&cache),
            config.lock.clone(),
        ));
        Self {
            cache,
            clock,
            locks,
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &DeviceSessionConfig {
        &self.config
    }

    /// Records a login from `device_id`.
    ///
    /// When the set is already at capacity the least recently used entry is
    /// evicted first, even if `device_id` itself is already a member. The
    /// device is then written with a fresh `lastAccess` and the whole set's
    /// TTL is reset.
    pub async fn register(
        &self,
        user_id: &str,
        device_id: &str,
        refresh_token: &str,
    ) -> AppResult<RegisterOutcome> {
        require_non_empty("user_id", user_id)?;
        require_non_empty("device_id", device_id)?;
        require_non_empty("refresh_token", refresh_token)?;

        let (device_id, refresh_token) = (device_id.to_string(), refresh_token.to_string());
        self.exclusive(user_id, move |store, user_id, lease| async move {
            store
                .register_locked(&lease, &user_id, &device_id, &refresh_token)
                .await
        })
        .await
    }

    /// Removes every device of the user except `current_device_id`.
    ///
    /// The current device's entry and the set's TTL are left untouched. If
    /// `current_device_id` is not a member the set ends up empty. Returns the
    /// number of devices removed.
    pub async fn revoke_other_devices(
        &self,
        user_id: &str,
        current_device_id: &str,
    ) -> AppResult<usize> {
        require_non_empty("user_id", user_id)?;
        require_non_empty("device_id", current_device_id)?;

        let current_device_id = current_device_id.to_string();
        self.exclusive(user_id, move |store, user_id, lease| async move {
            store
                .revoke_others_locked(&lease, &user_id, &current_device_id)
                .await
        })
        .await
    }

    /// Confirms `device_id` is still a member and marks it as just used.
    ///
    /// Fails with `InvalidDevice` when the device is not in the set (never
    /// registered, evicted, revoked, or the set expired). Only `lastAccess`
    /// changes; the set's TTL is not extended.
    pub async fn validate_device(&self, user_id: &str, device_id: &str) -> AppResult<DeviceSession> {
        require_non_empty("user_id", user_id)?;
        require_non_empty("device_id", device_id)?;

        let device_id = device_id.to_string();
        self.exclusive(user_id, move |store, user_id, lease| async move {
            store.validate_locked(&lease, &user_id, &device_id).await
        })
        .await
    }

    /// Lists the user's devices, most recently used first.
    pub async fn list_devices(&self, user_id: &str) -> AppResult<Vec<DeviceSession>> {
        require_non_empty("user_id", user_id)?;

        let key = keys::user_devices(user_id);
        let members = decode_members(user_id, self.cache.hget_all(&key).await?);

        let mut sessions: Vec<DeviceSession> = members
            .iter()
            .filter_map(|m| {
                m.value
                    .as_ref()
                    .map(|v| DeviceSession::from_value(user_id, &m.device_id, v))
            })
            .collect();
        sessions.sort_by(|a, b| {
            b.last_access
                .cmp(&a.last_access)
                .then_with(|| a.device_id.cmp(&b.device_id))
        });

        Ok(sessions)
    }

    /// Removes a single device. Returns `true` if it was a member.
    pub async fn revoke_device(&self, user_id: &str, device_id: &str) -> AppResult<bool> {
        require_non_empty("user_id", user_id)?;
        require_non_empty("device_id", device_id)?;

        let device_id = device_id.to_string();
        self.exclusive(user_id, move |store, user_id, lease| async move {
            lease.confirm().await?;
            let removed = store
                .cache
                .hdel(&keys::user_devices(&user_id), &device_id)
                .await?;
            if removed {
                info!(user_id = %user_id, device_id = %device_id, "Device session revoked");
            }
            Ok::<_, AppError>(removed)
        })
        .await
    }

    /// Removes every device of the user.
    pub async fn revoke_all_devices(&self, user_id: &str) -> AppResult<()> {
        require_non_empty("user_id", user_id)?;

        self.exclusive(user_id, move |store, user_id, lease| async move {
            lease.confirm().await?;
            store.cache.delete(&keys::user_devices(&user_id)).await?;
            info!(user_id = %user_id, "All device sessions revoked");
            Ok::<_, AppError>(())
        })
        .await
    }

    /// Runs `op` while holding the user's device set lock.
    ///
    /// Locking, `op`, and release run on their own task, so a caller that
    /// stops waiting neither interrupts a half-applied sequence nor strands
    /// the lease.
    async fn exclusive<T, F, Fut>(&self, user_id: &str, op: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(DeviceSessionStore, String, LeaseCheck) -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        let store = self.clone();
        let user_id = user_id.to_string();

        let task = tokio::spawn(async move {
            let guard = store.locks.acquire(&user_id).await?;
            let lease = guard.lease_check();
            let result = op(store, user_id, lease).await;
            guard.release().await;
            result
        });

        task.await
            .map_err(|e| AppError::internal(format!("Device set task failed: {e}")))?
    }

    async fn register_locked(
        &self,
        lease: &LeaseCheck,
        user_id: &str,
        device_id: &str,
        refresh_token: &str,
    ) -> AppResult<RegisterOutcome> {
        let key = keys::user_devices(user_id);
        let now = self.clock.now();

        let members = decode_members(user_id, self.cache.hget_all(&key).await?);
        let evicted = select_evictions(&members, self.config.max_devices);

        lease.confirm().await?;
        for victim in &evicted {
            self.cache.hdel(&key, victim).await?;
            info!(
                user_id = %user_id,
                device_id = %victim,
                incoming_device_id = %device_id,
                "Evicted least recently used device session"
            );
        }

        let previous = members
            .into_iter()
            .find(|m| m.device_id == device_id && !evicted.contains(&m.device_id));
        let replaced = previous.is_some();

        let mut value = SessionValue::new(refresh_token, now);
        if let Some(prior) = previous.and_then(|m| m.value) {
            value.extra = prior.extra;
        }

        self.cache.hset(&key, device_id, &value.encode()?).await?;
        if let Err(e) = self.cache.expire(&key, self.config.ttl()).await {
            // Without an expiry the entry would outlive the set.
            if let Err(cleanup) = self.cache.hdel(&key, device_id).await {
                warn!(
                    user_id = %user_id,
                    device_id = %device_id,
                    error = %cleanup,
                    "Failed to roll back device without expiry"
                );
            }
            return Err(e);
        }

        info!(
            user_id = %user_id,
            device_id = %device_id,
            replaced,
            evicted = evicted.len(),
            "Device session registered"
        );

        Ok(RegisterOutcome { evicted, replaced })
    }

    async fn revoke_others_locked(
        &self,
        lease: &LeaseCheck,
        user_id: &str,
        current_device_id: &str,
    ) -> AppResult<usize> {
        let key = keys::user_devices(user_id);
        let fields = self.cache.hget_all(&key).await?;

        lease.confirm().await?;

        let mut revoked = 0;
        for device_id in fields.keys().filter(|d| d.as_str() != current_device_id) {
            if self.cache.hdel(&key, device_id).await? {
                revoked += 1;
            }
        }

        if !fields.contains_key(current_device_id) && !fields.is_empty() {
            warn!(
                user_id = %user_id,
                device_id = %current_device_id,
                "Current device was not registered; all devices revoked"
            );
        }

        info!(
            user_id = %user_id,
            device_id = %current_device_id,
            revoked,
            "Other device sessions revoked"
        );

        Ok(revoked)
    }

    async fn validate_locked(
        &self,
        lease: &LeaseCheck,
        user_id: &str,
        device_id: &str,
    ) -> AppResult<DeviceSession> {
        let key = keys::user_devices(user_id);

        let raw = self
            .cache
            .hget(&key, device_id)
            .await?
            .ok_or_else(|| not_a_member(user_id, device_id))?;

        let mut value = match SessionValue::decode(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    device_id = %device_id,
                    error = %e,
                    "Rejecting device with undecodable session value"
                );
                return Err(not_a_member(user_id, device_id));
            }
        };

        value.last_access = self.clock.now();
        lease.confirm().await?;
        self.cache.hset(&key, device_id, &value.encode()?).await?;

        // The set's TTL can lapse between the read and the write, in which
        // case the write above re-created the hash without an expiry.
        if self.cache.ttl(&key).await?.is_none() {
            self.cache.hdel(&key, device_id).await?;
            warn!(
                user_id = %user_id,
                device_id = %device_id,
                "Device set expired during validation"
            );
            return Err(not_a_member(user_id, device_id));
        }

        debug!(user_id = %user_id, device_id = %device_id, "Device session validated");
        Ok(DeviceSession::from_value(user_id, device_id, &value))
    }
}

fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn not_a_member(user_id: &str, device_id: &str) -> AppError {
    AppError::invalid_device(format!(
        "Device '{device_id}' has no active session for user '{user_id}'"
    ))
}
