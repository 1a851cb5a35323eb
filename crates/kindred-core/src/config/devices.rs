//! Device session registry configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-user device session limits and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSessionConfig {
    /// Maximum number of devices a user may hold sessions on at once.
    #[serde(default = "default_max_devices")]
    pub max_devices: usize,
    /// Lifetime of a user's whole device set, renewed on every registration.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    /// Cross-process lease guarding the per-user read-modify-write sequence.
    #[serde(default)]
    pub lock: DeviceLockConfig,
}

impl Default for DeviceSessionConfig {
    fn default() -> Self {
        Self {
            max_devices: default_max_devices(),
            ttl_seconds: default_ttl_seconds(),
            lock: DeviceLockConfig::default(),
        }
    }
}

impl DeviceSessionConfig {
    /// The set lifetime as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Upper bound on cache calls made while one operation holds the lease.
    ///
    /// Revoking other devices reads the set, renews the lease, then deletes
    /// up to `max_devices` entries. Registration and validation need five.
    pub fn locked_round_trips(&self) -> u64 {
        (self.max_devices as u64 + 2).max(5)
    }
}

/// Cache-backed lease settings.
///
/// The in-process per-user mutex is always taken. The lease is only needed
/// when several server processes share one cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceLockConfig {
    /// Whether to take a lease in the cache before each operation.
    #[serde(default)]
    pub enabled: bool,
    /// How long a lease stays valid if its holder never releases it.
    #[serde(default = "default_lease_ms")]
    pub lease_ms: u64,
    /// How long to wait for a lease before failing with `StoreUnavailable`.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    /// Delay between acquisition attempts.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

impl Default for DeviceLockConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            lease_ms: default_lease_ms(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

impl DeviceLockConfig {
    /// Lease lifetime.
    pub fn lease(&self) -> Duration {
        Duration::from_millis(self.lease_ms)
    }

    /// Acquisition deadline.
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Poll interval while waiting.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms.max(1))
    }
}

fn default_max_devices() -> usize {
    5
}

fn default_ttl_seconds() -> u64 {
    7 * 24 * 60 * 60
}

fn default_lease_ms() -> u64 {
    15000
}

fn default_acquire_timeout_ms() -> u64 {
    2000
}

fn default_retry_interval_ms() -> u64 {
    25
}
