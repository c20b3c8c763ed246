//! shellkeep worker entry point.
//!
//! Boots the store, runs an install/activate cycle for the configured
//! version, and logs a summary. Logging goes to stderr as structured JSON.

use anyhow::Result;
use shellkeep_client::{FetchConfig, HttpNetwork};
use shellkeep_core::{AppConfig, StoreDb};
use shellkeep_worker::{LifecycleController, LoggedClients, WorkerState};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.cache_version, origin = %config.origin, "starting shellkeep worker");

    let db = StoreDb::open(&config.store_path).await?;
    let network = Arc::new(HttpNetwork::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.timeout(),
        max_redirects: config.max_redirects,
    })?);

    let mut controller = LifecycleController::new(db.clone(), network, Arc::new(LoggedClients), &config)?;
    controller.install().await?;

    // Without skip_waiting there is no old version to wait out in a CLI
    // run, so promote directly.
    if controller.state() == WorkerState::Waiting {
        controller.promote().await?;
    }

    let entries = match controller.store() {
        Some(store) => store.entry_count().await?,
        None => 0,
    };
    let versions = db.list_versions().await?;
    tracing::info!(version = %config.cache_version, entries, ?versions, "install cycle complete");

    Ok(())
}
