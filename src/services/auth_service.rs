//! Domain service for token authentication.
//!
//! Exchanges credentials for an opaque token and resolves tokens back to
//! their accounts.

use serde::Serialize;
use thiserror::Error;

use crate::models::account::Account;

/// Errors specific to authentication operations.
///
/// Credential failures are deliberately collapsed into one variant so a
/// caller cannot learn which factor was wrong.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unable to authenticate with provided credentials.")]
    InvalidCredentials,

    #[error("Invalid token.")]
    InvalidToken,

    #[error("Authentication credentials were not provided.")]
    MissingToken,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result of a successful credential exchange.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and returns the account's token, creating it on
    /// first login.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the email is unknown,
    /// the account is inactive, or the password does not match.
    async fn authenticate(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError>;

    /// Resolves a presented token to its active account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingToken`] for an empty token and
    /// [`AuthError::InvalidToken`] for a malformed, unknown, or inactive one.
    async fn authorize(&self, token: &str) -> Result<Account, AuthError>;
}
