//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kindred_auth::{DeviceSession, RegisterOutcome};

/// Result of a registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDeviceResponse {
    /// Devices evicted to make room, oldest first.
    pub evicted: Vec<String>,
    /// Whether the device already had an entry.
    pub replaced: bool,
}

impl From<RegisterOutcome> for RegisterDeviceResponse {
    fn from(outcome: RegisterOutcome) -> Self {
        Self {
            evicted: outcome.evicted,
            replaced: outcome.replaced,
        }
    }
}

/// A device as exposed over HTTP. The refresh token is never echoed back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceResponse {
    /// Device identifier.
    pub device_id: String,
    /// Most recent registration or validation.
    pub last_access: DateTime<Utc>,
}

impl From<DeviceSession> for DeviceResponse {
    fn from(session: DeviceSession) -> Self {
        Self {
            device_id: session.device_id,
            last_access: session.last_access,
        }
    }
}

/// Device listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceListResponse {
    /// Devices, most recently used first.
    pub devices: Vec<DeviceResponse>,
}

/// Bulk revocation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeOthersResponse {
    /// Number of devices removed.
    pub revoked: usize,
}

/// Single-device revocation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeDeviceResponse {
    /// Whether the device had an entry.
    pub revoked: bool,
}

/// Health check body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// `connected` or `unavailable`.
    pub cache: String,
    /// Crate version.
    pub version: String,
}
