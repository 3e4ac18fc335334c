use crate::config::Config;
use crate::db::wait::wait_for_url;

pub async fn cmd_wait_for_db(
    config: &Config,
    max_attempts: Option<u32>,
    interval_ms: Option<u64>,
) -> anyhow::Result<()> {
    let mut wait = config.database_wait.clone();
    if let Some(max_attempts) = max_attempts {
        wait.max_attempts = max_attempts;
    }
    if let Some(interval_ms) = interval_ms {
        wait.interval_ms = interval_ms;
    }

    let attempts = wait_for_url(&config.general.database_url, &wait).await?;
    println!("✓ Database available after {attempts} attempt(s)");

    Ok(())
}
