//! Store maintenance worker.
//!
//! Connects to the shared Postgres record store, runs its migrations, and
//! periodically purges expired entries. Reads already treat expired rows as
//! absent; this loop only keeps the table from accumulating dead rows.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use storepilot_store::PgStore;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default seconds between purge sweeps.
const DEFAULT_PURGE_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storepilot_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let purge_interval_secs: u64 = std::env::var("PURGE_INTERVAL_SECS")
        .unwrap_or_else(|_| DEFAULT_PURGE_INTERVAL_SECS.to_string())
        .parse()
        .map_err(|_| anyhow::anyhow!("PURGE_INTERVAL_SECS must be a valid u64"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    PgStore::migrate(&pool).await?;
    let store = PgStore::new(pool);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    let mut ticker = tokio::time::interval(Duration::from_secs(purge_interval_secs));
    tracing::info!(purge_interval_secs, "Maintenance worker started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Maintenance worker shutting down");
                break;
            }
            _ = ticker.tick() => {
                match store.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => tracing::debug!(purged, "Purged expired records"),
                    Err(e) => tracing::error!(error = %e, "Purge cycle failed"),
                }
            }
        }
    }

    Ok(())
}
