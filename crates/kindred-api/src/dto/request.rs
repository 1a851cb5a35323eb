//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Device registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterDeviceRequest {
    /// Device identifier chosen by the client.
    #[validate(length(min = 1, max = 256, message = "Device ID must be 1 to 256 characters"))]
    pub device_id: String,
    /// Refresh token issued for this login.
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}
