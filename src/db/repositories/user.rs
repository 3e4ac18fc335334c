use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users;
use crate::models::account::{Account, AccountUpdate, ProfileFields, normalize_email};

/// Errors raised by the account factory functions before touching storage.
#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("User must provide a valid email address")]
    MissingEmail,

    #[error("User must provide a password")]
    MissingPassword,

    #[error("A user with this email already exists")]
    DuplicateEmail,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Account>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(Account::from))
    }

    /// Exact match on the stored (already normalized) email, together with
    /// the password hash (for login)
    pub async fn get_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(Account, String)>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (Account::from(u), password_hash)
        }))
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("Failed to count users by email")?;

        Ok(count > 0)
    }

    /// Applies a partial update. `password_hash` must already be hashed.
    pub async fn update_profile(
        &self,
        id: i32,
        update: &AccountUpdate,
        password_hash: Option<String>,
    ) -> Result<Account> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        if let Some(username) = &update.username {
            active.username = Set(Some(username.clone()));
        }
        if let Some(first_name) = &update.first_name {
            active.first_name = Set(Some(first_name.clone()));
        }
        if let Some(last_name) = &update.last_name {
            active.last_name = Set(Some(last_name.clone()));
        }
        if let Some(hash) = password_hash {
            active.password_hash = Set(hash);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update user profile")?;

        Ok(Account::from(model))
    }

    pub async fn touch_last_login(&self, id: i32) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        users::Entity::update_many()
            .col_expr(users::Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(users::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to record last login")?;

        Ok(())
    }

    /// Deactivation is the only teardown path; rows are never deleted.
    pub async fn set_active(&self, email: &str, active: bool) -> Result<bool> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::IsActive, sea_orm::sea_query::Expr::value(active))
            .col_expr(
                users::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(users::Column::Email.eq(normalize_email(email)))
            .exec(&self.conn)
            .await
            .context("Failed to update user active flag")?;

        Ok(result.rows_affected > 0)
    }
}

/// Creates a regular account. Only checks that email and password are
/// present; password policy is the caller's concern.
pub async fn create_user(
    conn: &DatabaseConnection,
    security: &SecurityConfig,
    email: &str,
    password: &str,
    profile: &ProfileFields,
) -> Result<Account, CreateUserError> {
    insert_user(conn, security, email, password, profile, false).await
}

/// Creates an account with the staff and superuser flags set.
pub async fn create_superuser(
    conn: &DatabaseConnection,
    security: &SecurityConfig,
    email: &str,
    password: &str,
    profile: &ProfileFields,
) -> Result<Account, CreateUserError> {
    insert_user(conn, security, email, password, profile, true).await
}

async fn insert_user(
    conn: &DatabaseConnection,
    security: &SecurityConfig,
    email: &str,
    password: &str,
    profile: &ProfileFields,
    superuser: bool,
) -> Result<Account, CreateUserError> {
    if email.trim().is_empty() {
        return Err(CreateUserError::MissingEmail);
    }
    if password.is_empty() {
        return Err(CreateUserError::MissingPassword);
    }

    let email = normalize_email(email);
    let password_hash = hash_password_blocking(password, security).await?;
    let now = chrono::Utc::now().to_rfc3339();

    let active = users::ActiveModel {
        email: Set(email),
        first_name: Set(profile.first_name.clone()),
        last_name: Set(profile.last_name.clone()),
        username: Set(profile.username.clone()),
        password_hash: Set(password_hash),
        is_staff: Set(superuser),
        is_superuser: Set(superuser),
        is_active: Set(true),
        last_login: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    match active.insert(conn).await {
        Ok(model) => Ok(Account::from(model)),
        Err(e) if is_unique_violation(&e) => Err(CreateUserError::DuplicateEmail),
        Err(e) => Err(CreateUserError::Other(
            anyhow::Error::new(e).context("Failed to insert user"),
        )),
    }
}

#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn argon2_for(config: &SecurityConfig) -> Result<Argon2<'static>> {
    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None, // output length (use default)
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using Argon2id with the configured params.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2_for(config)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a password against a PHC hash string. The params embedded in the
/// hash are used, so hashes made under older settings still verify.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Argon2 is CPU-intensive, so hashing runs off the async runtime.
pub async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();

    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .context("Password hashing task panicked")?
}

pub async fn verify_password_blocking(password: &str, password_hash: String) -> Result<bool> {
    let password = password.to_string();

    task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .context("Password verification task panicked")?
}
