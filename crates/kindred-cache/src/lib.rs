//! # kindred-cache
//!
//! Cache provider implementations for Kindred. Supports two modes:
//!
//! - **memory**: In-process hash store on [dashmap](https://crates.io/crates/dashmap)
//!   with explicit per-key expiry
//! - **redis**: Redis-backed store using the [redis](https://crates.io/crates/redis) crate
//!
//! The provider is selected at runtime based on configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::CacheManager;
