use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{ingredients, recipes, reviews, tags, users};
use crate::models::account::{Account, AccountUpdate, ProfileFields};
use crate::models::recipe::{NewRecipe, NewReview, RecipeDetails};

pub mod migrator;
pub mod repositories;
pub mod wait;

pub use repositories::catalog::CatalogError;
pub use repositories::user::CreateUserError;

/// Explicit storage handle. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let conn = Self::connect(db_url, max_connections, min_connections).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    async fn connect(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<DatabaseConnection> {
        if db_url.starts_with("sqlite:") && !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        Ok(Database::connect(opt).await?)
    }

    /// Opens a single short-lived connection and runs `SELECT 1`, without
    /// applying migrations. Used by the readiness command.
    pub async fn ping_url(db_url: &str) -> Result<()> {
        let conn = Self::connect(db_url, 1, 0).await?;
        let store = Self { conn };
        let result = store.ping().await;
        store.conn.close().await.ok();
        result
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn catalog_repo(&self) -> repositories::catalog::CatalogRepository {
        repositories::catalog::CatalogRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn create_user(
        &self,
        security: &SecurityConfig,
        email: &str,
        password: &str,
        profile: &ProfileFields,
    ) -> Result<Account, CreateUserError> {
        repositories::user::create_user(&self.conn, security, email, password, profile).await
    }

    pub async fn create_superuser(
        &self,
        security: &SecurityConfig,
        email: &str,
        password: &str,
        profile: &ProfileFields,
    ) -> Result<Account, CreateUserError> {
        repositories::user::create_superuser(&self.conn, security, email, password, profile).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<Account>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(Account, String)>> {
        self.user_repo().get_by_email_with_password(email).await
    }

    pub async fn user_email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn update_user_profile(
        &self,
        id: i32,
        update: &AccountUpdate,
        password_hash: Option<String>,
    ) -> Result<Account> {
        self.user_repo()
            .update_profile(id, update, password_hash)
            .await
    }

    pub async fn touch_user_last_login(&self, id: i32) -> Result<()> {
        self.user_repo().touch_last_login(id).await
    }

    pub async fn set_user_active(&self, email: &str, active: bool) -> Result<bool> {
        self.user_repo().set_active(email, active).await
    }

    /// Raw row including the hash. Only for credential checks and tests.
    pub async fn get_user_row(&self, id: i32) -> Result<Option<users::Model>> {
        use sea_orm::EntityTrait;

        Ok(users::Entity::find_by_id(id).one(&self.conn).await?)
    }

    // ========== Token Repository Methods ==========

    pub async fn get_or_create_token(&self, user_id: i32) -> Result<String> {
        self.token_repo().get_or_create(user_id).await
    }

    pub async fn get_user_token(&self, user_id: i32) -> Result<Option<String>> {
        self.token_repo().get_for_user(user_id).await
    }

    pub async fn find_user_by_token(&self, key: &str) -> Result<Option<users::Model>> {
        self.token_repo().find_user(key).await
    }

    // ========== Catalog Repository Methods ==========

    pub async fn create_tag(&self, user_id: i32, name: &str) -> Result<tags::Model, CatalogError> {
        self.catalog_repo().create_tag(user_id, name).await
    }

    pub async fn create_ingredient(&self, name: &str) -> Result<ingredients::Model, CatalogError> {
        self.catalog_repo().create_ingredient(name).await
    }

    pub async fn create_recipe(
        &self,
        user_id: i32,
        input: &NewRecipe,
    ) -> Result<recipes::Model, CatalogError> {
        self.catalog_repo().create_recipe(user_id, input).await
    }

    pub async fn create_review(
        &self,
        user_id: i32,
        input: &NewReview,
    ) -> Result<reviews::Model, CatalogError> {
        self.catalog_repo().create_review(user_id, input).await
    }

    pub async fn get_recipe(&self, id: i32) -> Result<Option<RecipeDetails>, CatalogError> {
        self.catalog_repo().get_recipe(id).await
    }

    pub async fn list_reviews_for_recipe(
        &self,
        recipe_id: i32,
    ) -> Result<Vec<reviews::Model>, CatalogError> {
        self.catalog_repo().list_reviews_for_recipe(recipe_id).await
    }
}
