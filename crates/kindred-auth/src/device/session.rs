//! Device session records and their cache encoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kindred_core::result::AppResult;

/// The value stored under a device ID in a user's device hash.
///
/// Encoded as a JSON object with `refreshToken` and `lastAccess` (RFC 3339).
/// Fields this type does not know about are kept in `extra` and written
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionValue {
    /// Opaque refresh credential issued for this device.
    pub refresh_token: String,
    /// Most recent registration or validation.
    pub last_access: DateTime<Utc>,
    /// Unrecognized fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionValue {
    /// A fresh value with no extra fields.
    pub fn new(refresh_token: impl Into<String>, last_access: DateTime<Utc>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            last_access,
            extra: serde_json::Map::new(),
        }
    }

    /// Parse a stored value.
    pub fn decode(raw: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Serialize for storage.
    pub fn encode(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// One device's session, as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSession {
    /// Owning user.
    pub user_id: String,
    /// Device identifier, unique within the user's set.
    pub device_id: String,
    /// Refresh credential bound to the device.
    pub refresh_token: String,
    /// Most recent registration or validation.
    pub last_access: DateTime<Utc>,
}

impl DeviceSession {
    pub(crate) fn from_value(user_id: &str, device_id: &str, value: &SessionValue) -> Self {
        Self {
            user_id: user_id.to_string(),
            device_id: device_id.to_string(),
            refresh_token: value.refresh_token.clone(),
            last_access: value.last_access,
        }
    }
}

/// What a registration changed besides writing the device itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterOutcome {
    /// Devices removed to respect the capacity bound, oldest first.
    pub evicted: Vec<String>,
    /// Whether the registered device already had a surviving entry.
    pub replaced: bool,
}
