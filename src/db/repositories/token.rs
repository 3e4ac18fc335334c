use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::{auth_tokens, users};

use super::user::is_unique_violation;

/// Length of a token key in hex characters.
pub const TOKEN_LEN: usize = 40;

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_for_user(&self, user_id: i32) -> Result<Option<String>> {
        let token = auth_tokens::Entity::find()
            .filter(auth_tokens::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query token by user")?;

        Ok(token.map(|t| t.key))
    }

    /// Returns the user's token, minting one if none exists yet.
    pub async fn get_or_create(&self, user_id: i32) -> Result<String> {
        if let Some(key) = self.get_for_user(user_id).await? {
            return Ok(key);
        }

        let key = generate_token();
        let active = auth_tokens::ActiveModel {
            key: Set(key.clone()),
            user_id: Set(user_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        match active.insert(&self.conn).await {
            Ok(_) => Ok(key),
            // A concurrent login for the same user won the insert
            Err(e) if is_unique_violation(&e) => self
                .get_for_user(user_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Token vanished for user {user_id}")),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to insert token")),
        }
    }

    /// Resolve a token key to the user row that owns it
    pub async fn find_user(&self, key: &str) -> Result<Option<users::Model>> {
        let found = auth_tokens::Entity::find_by_id(key.to_string())
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query token")?;

        Ok(found.and_then(|(_, user)| user))
    }
}

/// Generate a random token key (40 character hex string)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; TOKEN_LEN / 2] = rng.random();

    bytes.iter().fold(String::with_capacity(TOKEN_LEN), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Cheap shape check before hitting the database.
#[must_use]
pub fn is_well_formed(key: &str) -> bool {
    key.len() == TOKEN_LEN && key.bytes().all(|b| b.is_ascii_hexdigit())
}
