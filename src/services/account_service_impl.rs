//! `SeaORM` implementation of the `AccountService` trait.

use crate::config::SecurityConfig;
use crate::db::{CreateUserError, Store};
use crate::db::repositories::user::hash_password_blocking;
use crate::models::account::{
    Account, AccountUpdate, PROFILE_FIELD_MAX_LEN, ProfileFields, is_valid_email, normalize_email,
};
use crate::services::account_service::{AccountError, AccountService, FieldErrors};
use crate::services::password_policy::{PasswordPolicy, UserContext};
use async_trait::async_trait;
use tracing::info;

const BLANK: &str = "This field may not be blank.";
const INVALID_EMAIL: &str = "Enter a valid email address.";
const DUPLICATE_EMAIL: &str = "user with this email already exists.";

pub struct SeaOrmAccountService {
    store: Store,
    security: SecurityConfig,
    policy: PasswordPolicy,
}

impl SeaOrmAccountService {
    #[must_use]
    pub fn new(store: Store, security: SecurityConfig) -> Self {
        let policy = PasswordPolicy::from_config(&security.password_policy);
        Self {
            store,
            security,
            policy,
        }
    }

    /// Overrides the policy derived from config.
    #[must_use]
    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn check_profile_lengths(
        errors: &mut FieldErrors,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) {
        for (field, value) in [
            ("username", username),
            ("first_name", first_name),
            ("last_name", last_name),
        ] {
            if let Some(value) = value
                && value.chars().count() > PROFILE_FIELD_MAX_LEN
            {
                errors.add(
                    field,
                    format!("Ensure this field has no more than {PROFILE_FIELD_MAX_LEN} characters."),
                );
            }
        }
    }

    fn check_password(&self, errors: &mut FieldErrors, password: &str, user: &UserContext<'_>) {
        if password.is_empty() {
            errors.add("password", BLANK);
            return;
        }

        if let Err(violations) = self.policy.validate(password, user) {
            for violation in violations {
                errors.add("password", violation.to_string());
            }
        }
    }

    /// Validates a registration payload and returns the normalized email.
    async fn validate_registration(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileFields,
    ) -> Result<String, AccountError> {
        let mut errors = FieldErrors::new();

        let email = normalize_email(email);
        if email.is_empty() {
            errors.add("email", BLANK);
        } else if !is_valid_email(&email) {
            errors.add("email", INVALID_EMAIL);
        }

        Self::check_profile_lengths(
            &mut errors,
            profile.username.as_deref(),
            profile.first_name.as_deref(),
            profile.last_name.as_deref(),
        );

        let context = UserContext {
            email: Some(&email),
            username: profile.username.as_deref(),
            first_name: profile.first_name.as_deref(),
            last_name: profile.last_name.as_deref(),
        };
        self.check_password(&mut errors, password, &context);

        if errors.get("email").is_none() && self.store.user_email_exists(&email).await? {
            errors.add("email", DUPLICATE_EMAIL);
        }

        errors.into_result()?;
        Ok(email)
    }

    async fn create(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileFields,
        superuser: bool,
    ) -> Result<Account, AccountError> {
        let email = self.validate_registration(email, password, profile).await?;

        let created = if superuser {
            self.store
                .create_superuser(&self.security, &email, password, profile)
                .await
        } else {
            self.store
                .create_user(&self.security, &email, password, profile)
                .await
        };

        let account = created.map_err(|e| match e {
            // Lost a race with a concurrent registration
            CreateUserError::DuplicateEmail => {
                AccountError::Validation(FieldErrors::single("email", DUPLICATE_EMAIL))
            }
            CreateUserError::MissingEmail => {
                AccountError::Validation(FieldErrors::single("email", BLANK))
            }
            CreateUserError::MissingPassword => {
                AccountError::Validation(FieldErrors::single("password", BLANK))
            }
            CreateUserError::Other(e) => AccountError::Internal(e.to_string()),
        })?;

        metrics::counter!("accounts_registered_total").increment(1);
        info!(
            account_id = account.id,
            superuser = superuser,
            "Account registered"
        );

        Ok(account)
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn register(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileFields,
    ) -> Result<Account, AccountError> {
        self.create(email, password, profile, false).await
    }

    async fn register_superuser(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileFields,
    ) -> Result<Account, AccountError> {
        self.create(email, password, profile, true).await
    }

    async fn get_profile(&self, account_id: i32) -> Result<Account, AccountError> {
        self.store
            .get_user(account_id)
            .await?
            .ok_or(AccountError::NotFound)
    }

    async fn update_self(
        &self,
        account: &Account,
        update: &AccountUpdate,
    ) -> Result<Account, AccountError> {
        if update.is_empty() {
            return self.get_profile(account.id).await;
        }

        let mut errors = FieldErrors::new();
        Self::check_profile_lengths(
            &mut errors,
            update.username.as_deref(),
            update.first_name.as_deref(),
            update.last_name.as_deref(),
        );

        if let Some(password) = &update.password {
            // Judge the password against the profile as it will look afterwards
            let context = UserContext {
                email: Some(&account.email),
                username: update.username.as_deref().or(account.username.as_deref()),
                first_name: update
                    .first_name
                    .as_deref()
                    .or(account.first_name.as_deref()),
                last_name: update
                    .last_name
                    .as_deref()
                    .or(account.last_name.as_deref()),
            };
            self.check_password(&mut errors, password, &context);
        }

        errors.into_result()?;

        let password_hash = match &update.password {
            Some(password) => Some(hash_password_blocking(password, &self.security).await?),
            None => None,
        };
        let password_changed = password_hash.is_some();

        let updated = self
            .store
            .update_user_profile(account.id, update, password_hash)
            .await?;

        info!(
            account_id = account.id,
            password_changed = password_changed,
            "Account profile updated"
        );

        Ok(updated)
    }
}
