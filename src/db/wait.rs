//! Block until the database accepts connections.
//!
//! Containers often start the app before the database is listening; this
//! polls until it is.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DatabaseWaitConfig;

/// Runs `check` until it succeeds, sleeping `interval` between attempts.
///
/// Returns the number of checks made. With `max_attempts == 0` it never
/// gives up; otherwise it fails once that many checks have failed.
pub async fn wait_for_database<F, Fut>(
    mut check: F,
    interval: Duration,
    max_attempts: u32,
) -> Result<u32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    info!("Waiting for database...");

    let mut attempts = 0u32;
    loop {
        attempts += 1;
        match check().await {
            Ok(()) => {
                info!(attempts, "Database available!");
                return Ok(attempts);
            }
            Err(e) => {
                if max_attempts > 0 && attempts >= max_attempts {
                    anyhow::bail!("Database still unavailable after {attempts} attempts: {e}");
                }
                warn!(
                    error = %e,
                    "Database unavailable, retrying in {} ms...",
                    interval.as_millis()
                );
                tokio::time::sleep(interval).await;
            }
        }
    }
}

/// Probes `database_url` with the configured interval and attempt limit.
pub async fn wait_for_url(database_url: &str, config: &DatabaseWaitConfig) -> Result<u32> {
    wait_for_database(
        || super::Store::ping_url(database_url),
        Duration::from_millis(config.interval_ms),
        config.max_attempts,
    )
    .await
}
