//! Identity error model.

use thiserror::Error;

/// Result type used across the identity layer.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Error taxonomy shared by the store, the services and the HTTP edge.
///
/// Every backend-specific failure is folded into one of these variants before
/// it leaves the infrastructure layer, so callers never match on storage
/// details.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Malformed or missing input (caller error).
    #[error("validation failed: {0}")]
    Validation(String),

    /// No principal matches the given id or login.
    #[error("user not found")]
    NotFound,

    /// The login is already taken by another principal.
    #[error("user already exists")]
    AlreadyExists,

    /// The supplied password does not match the stored digest.
    #[error("wrong password")]
    WrongPassword,

    /// Missing, malformed, forged or expired session token.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Valid token, insufficient role.
    #[error("forbidden")]
    Forbidden,

    /// Hashing, backing-store or serialization fault.
    ///
    /// The payload is for operational logs only and must never be sent to a
    /// client.
    #[error("internal failure: {0}")]
    Internal(String),
}

impl IdentityError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
