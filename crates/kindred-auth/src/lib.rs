//! # kindred-auth
//!
//! Multi-device session registry for the Kindred platform.
//!
//! Each user owns a bounded set of device sessions stored as one cache hash
//! with a single expiry. The [`DeviceSessionStore`] registers devices,
//! evicts the least recently used one when the set is full, revokes devices,
//! and validates devices on each authenticated request. Every mutating
//! operation runs inside a per-user critical section.
//!
//! ## Modules
//!
//! - `device`: session records, eviction order, per-user locking, and the store

pub mod device;

pub use device::{DeviceSession, DeviceSessionStore, RegisterOutcome, SessionValue};
