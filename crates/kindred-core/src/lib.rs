//! # kindred-core
//!
//! Core crate for the Kindred device session registry. Contains the cache
//! and clock traits, configuration schemas, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Kindred crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
