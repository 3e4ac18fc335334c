//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::db::repositories::token::is_well_formed;
use crate::db::repositories::user::{hash_password_blocking, verify_password_blocking};
use crate::models::account::{Account, normalize_email};
use crate::services::auth_service::{AuthError, AuthService, IssuedToken};
use async_trait::async_trait;
use tracing::{debug, info};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn check_credentials(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let email = normalize_email(email);
        let Some((account, password_hash)) =
            self.store.get_user_by_email_with_password(&email).await?
        else {
            // Spend the same hashing time as a real check
            hash_password_blocking(password, &self.security).await?;
            return Err(AuthError::InvalidCredentials);
        };

        let is_valid = verify_password_blocking(password, password_hash).await?;
        if !is_valid || !account.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(account)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn authenticate(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let account = match self.check_credentials(email, password).await {
            Ok(account) => account,
            Err(e) => {
                let outcome = if matches!(e, AuthError::InvalidCredentials) {
                    "rejected"
                } else {
                    "error"
                };
                metrics::counter!("auth_attempts_total", "outcome" => outcome).increment(1);
                return Err(e);
            }
        };

        let token = self.store.get_or_create_token(account.id).await?;
        self.store.touch_user_last_login(account.id).await?;

        metrics::counter!("auth_attempts_total", "outcome" => "success").increment(1);
        info!(account_id = account.id, "Token issued");

        Ok(IssuedToken { token })
    }

    async fn authorize(&self, token: &str) -> Result<Account, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        if !is_well_formed(token) {
            debug!("Rejected malformed token");
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .store
            .find_user_by_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !user.is_active {
            return Err(AuthError::InvalidToken);
        }

        Ok(Account::from(user))
    }
}
