//! Unified application error types for MemberHub.
//!
//! Every fallible path across the workspace resolves to [`AppError`], so
//! `?` composes from the stores up through the services.

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

/// Coarse error category; drives retry decisions and boundary mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Lookup by id or username matched nothing.
    NotFound,
    /// A notification or message spec failed validation (missing recipient,
    /// empty body, and so on). Retrying the identical call cannot succeed.
    InvalidSpec,
    /// The acting user is not a participant of the targeted conversation.
    NotParticipant,
    /// A conflict occurred (duplicate entry, closed conversation, etc.).
    Conflict,
    /// The presented credential was missing, malformed, or failed validation.
    Unauthorized,
    /// The persistence gateway failed. The failure is assumed transient and
    /// the operation is safe to retry.
    Persistence,
    /// A realtime delivery failure. Never surfaced to service callers; the
    /// broadcaster swallows these and prunes the dead channel instead.
    Delivery,
    /// Configuration could not be assembled or failed to parse.
    Configuration,
    /// JSON encoding or decoding failed.
    Serialization,
    /// Unclassified failure.
    Internal,
}

impl ErrorKind {
    const fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidSpec => "INVALID_SPEC",
            ErrorKind::NotParticipant => "NOT_PARTICIPANT",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Persistence => "PERSISTENCE",
            ErrorKind::Delivery => "DELIVERY",
            ErrorKind::Configuration => "CONFIGURATION",
            ErrorKind::Serialization => "SERIALIZATION",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The unified application error used throughout MemberHub.
///
/// Lower-level errors arrive through `From` impls or explicit `.map_err()`
/// at the boundary where enough context exists for a useful message.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// Category, stable across message wording changes.
    pub kind: ErrorKind,
    /// Human-readable context for logs.
    pub message: String,
    /// Underlying cause, kept for error-chain logging.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Build an error with no underlying cause.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Build an error wrapping a lower-level cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Shorthand for [`ErrorKind::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Shorthand for [`ErrorKind::InvalidSpec`].
    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSpec, message)
    }

    /// Shorthand for [`ErrorKind::NotParticipant`].
    pub fn not_participant(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotParticipant, message)
    }

    /// Shorthand for [`ErrorKind::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Shorthand for [`ErrorKind::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Shorthand for [`ErrorKind::Persistence`].
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Persistence, message)
    }

    /// Shorthand for [`ErrorKind::Delivery`].
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Delivery, message)
    }

    /// Shorthand for [`ErrorKind::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Shorthand for [`ErrorKind::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether retrying the failed operation with identical arguments can
    /// succeed. Only persistence failures qualify; spec and participant
    /// errors are terminal for the caller.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Persistence
    }
}

impl Clone for AppError {
    // The boxed source is not Clone; a clone keeps kind and message only.
    fn clone(&self) -> Self {
        Self::new(self.kind, self.message.clone())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorKind::Serialization, format!("JSON codec failure: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(ErrorKind::Configuration, format!("Configuration source: {err}"), err)
    }
}
