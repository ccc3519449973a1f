//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
///
/// `InvalidCredentials` and `DuplicateEmail` are expected outcomes that
/// handlers turn into form errors; the other variants are infrastructure
/// failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password, unknown email, or deactivated account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Another account already uses this email.
    #[error("email address is already in use")]
    DuplicateEmail,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error (bad parameters, corrupt stored hash, worker panic).
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}
