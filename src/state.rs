use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, AuthService, PasswordPolicy, SeaOrmAccountService, SeaOrmAuthService,
};

/// Services shared by the HTTP API and the CLI commands.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub account_service: Arc<dyn AccountService>,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::from_store(config, store))
    }

    #[must_use]
    pub fn from_store(config: Config, store: Store) -> Self {
        let policy = PasswordPolicy::from_config(&config.security.password_policy);
        Self::with_policy(config, store, policy)
    }

    /// Like [`SharedState::from_store`] but with an explicit password policy.
    #[must_use]
    pub fn with_policy(config: Config, store: Store, policy: PasswordPolicy) -> Self {
        let account_service = Arc::new(
            SeaOrmAccountService::new(store.clone(), config.security.clone()).with_policy(policy),
        );
        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        ));

        Self {
            config: Arc::new(config),
            store,
            account_service,
            auth_service,
        }
    }
}
