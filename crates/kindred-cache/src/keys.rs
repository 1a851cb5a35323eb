//! Cache key builders for all Kindred cache entries.
//!
//! Keys are unprefixed here; the Redis provider prepends its configured
//! `key_prefix`.

/// Hash holding every device session of a user, keyed by device ID.
pub fn user_devices(user_id: &str) -> String {
    format!("user:{user_id}:devices")
}

/// Lease serializing read-modify-write sequences on a user's device hash.
pub fn user_devices_lock(user_id: &str) -> String {
    format!("user:{user_id}:devices:lock")
}
