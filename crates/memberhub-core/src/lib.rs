//! # memberhub-core
//!
//! Core crate for MemberHub, the notification and messaging backbone of the
//! franchise member portal. Contains configuration schemas, pagination types,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other MemberHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
