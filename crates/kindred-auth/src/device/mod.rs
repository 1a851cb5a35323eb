//! Device session registry.
//!
//! Provides per-user critical sections using either:
//! - an in-process keyed mutex (always taken)
//! - a cache lease with owner-checked release (for multi-node deployments)

pub mod eviction;
pub mod lock;
pub mod session;
pub mod store;

pub use lock::{DeviceSetGuard, DeviceSetLocks, LeaseCheck};
pub use session::{DeviceSession, RegisterOutcome, SessionValue};
pub use store::DeviceSessionStore;
