//! Core error taxonomy
//!
//! Every service in this crate returns [`CoreResult`]. The HTTP layer maps each
//! variant onto a status code; nothing here knows about HTTP.
//!
//! Ownership failures are deliberately folded into [`CoreError::NotFound`] so a
//! caller cannot discover ids that belong to someone else.

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Result alias used by services
pub type CoreResult<T> = Result<T, CoreError>;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Human-readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the identity, token, filter and lifecycle services
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The account exists but was created through OAuth and has no password
    #[error("This account has no password; sign in with the linked provider")]
    PasswordLoginUnavailable,

    /// Bad signature, malformed token, wrong issuer or expired
    #[error("Invalid or expired token")]
    TokenInvalid,

    /// Token subject no longer resolves to a user
    #[error("User not found")]
    UserNotFound,

    /// Entity absent or owned by someone else
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Cross reference points at an entity the actor does not own
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Restore or purge attempted on a task that is not in the trash
    #[error("Task is not in the trash")]
    NotInTrash,

    /// Caller-supplied values are malformed
    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    /// Unique constraint on a caller-supplied value (e.g. email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Opaque storage fault
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Unexpected failure outside storage (hashing, token encoding)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation(vec![FieldError::new(field, message)])
    }
}
