//! # kindred-api
//!
//! HTTP API layer for the Kindred device session registry, built on Axum.
//!
//! Exposes registration, validation, listing, and revocation of a user's
//! device sessions, plus a cache health check. Errors from the domain layer
//! are mapped to JSON error bodies with stable codes.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
