//! Convenience result type alias for Postflow.

use crate::error::AppError;

/// A specialized `Result` type for Postflow operations.
pub type AppResult<T> = Result<T, AppError>;
