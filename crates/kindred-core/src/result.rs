//! Convenience result type alias for Kindred.

use crate::error::AppError;

/// A specialized `Result` type for Kindred operations.
pub type AppResult<T> = Result<T, AppError>;
