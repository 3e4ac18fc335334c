//! Domain service for account registration and profile self-service.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::models::account::{Account, AccountUpdate, ProfileFields};

/// Field name to error messages, in stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), AccountError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AccountError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Account not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for accounts.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Validates the payload and creates a regular account.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Validation`] for missing or malformed fields,
    /// a password rejected by the policy, or an email that is already taken.
    async fn register(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileFields,
    ) -> Result<Account, AccountError>;

    /// Same validation as [`AccountService::register`], with staff and
    /// superuser flags set.
    async fn register_superuser(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileFields,
    ) -> Result<Account, AccountError>;

    /// Gets the current state of an account.
    async fn get_profile(&self, account_id: i32) -> Result<Account, AccountError>;

    /// Applies a partial update to the caller's own account. A supplied
    /// password is policy-checked and re-hashed.
    async fn update_self(
        &self,
        account: &Account,
        update: &AccountUpdate,
    ) -> Result<Account, AccountError>;
}
