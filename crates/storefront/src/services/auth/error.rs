//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field was missing or blank.
    #[error("missing required fields")]
    MissingFields,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] yemeni_market_core::EmailError),

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// An account already uses this email.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Invalid credentials (wrong password or unknown account).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Token failed verification or has expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Token is valid but was issued for another purpose.
    #[error("invalid token type")]
    InvalidTokenType,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// Token could not be signed.
    #[error("token signing error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}
