use crate::config::Config;
use crate::db::Store;
use crate::models::account::{ProfileFields, normalize_email};
use crate::services::{AccountError, AccountService, SeaOrmAccountService};

pub async fn cmd_create_superuser(
    config: &Config,
    email: &str,
    password: &str,
    profile: ProfileFields,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_url).await?;
    let service = SeaOrmAccountService::new(store, config.security.clone());

    match service.register_superuser(email, password, &profile).await {
        Ok(account) => {
            println!("✓ Superuser created: {} (ID: {})", account.email, account.id);
            Ok(())
        }
        Err(AccountError::Validation(errors)) => {
            println!("Could not create superuser:");
            for (field, messages) in errors.into_inner() {
                for message in messages {
                    println!("  {field}: {message}");
                }
            }
            anyhow::bail!("invalid superuser details")
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn cmd_set_active(config: &Config, email: &str, active: bool) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_url).await?;
    let email = normalize_email(email);

    if store.set_user_active(&email, active).await? {
        let state = if active { "Activated" } else { "Deactivated" };
        println!("✓ {state}: {email}");
    } else {
        println!("No account with email {email}.");
    }

    Ok(())
}
