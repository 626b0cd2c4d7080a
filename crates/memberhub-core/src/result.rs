//! Workspace-wide result alias.

use crate::error::AppError;

/// What every fallible MemberHub operation returns.
pub type AppResult<T> = Result<T, AppError>;
