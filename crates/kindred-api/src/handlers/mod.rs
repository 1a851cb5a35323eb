//! Route handlers organized by domain.

pub mod devices;
pub mod health;
