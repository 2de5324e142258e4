//! Feed sync — Binary Entrypoint
//! Loads config, then runs one fetch/merge cycle or the periodic scheduler.

use std::sync::Arc;

use anyhow::Context;
use quake_feed_sync::ingest::{
    self,
    config::load_config_default,
    providers::bmkg::BmkgFeed,
    scheduler::{spawn_scheduler, SchedulerCfg},
    store::JsonFileStore,
    types::{FeedSource, SnapshotStore},
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; `QUAKE_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quake_feed_sync=info,ingest=info,warn"));
    let json = std::env::var("QUAKE_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default().context("loading pipeline config")?;
    tracing::info!(
        feed = %cfg.feed_url,
        snapshot = %cfg.snapshot_path.display(),
        key = %cfg.merge_key,
        interval_secs = cfg.interval_secs,
        "starting"
    );

    let source: Arc<dyn FeedSource> = Arc::new(BmkgFeed::from_url(
        cfg.feed_url.clone(),
        cfg.fetch_timeout(),
    )?);
    let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileStore::new(cfg.snapshot_path.clone()));

    if cfg.interval_secs == 0 {
        let report = ingest::run_cycle(
            source.as_ref(),
            store.as_ref(),
            cfg.merge_key,
            chrono::Utc::now(),
        )
        .await?;
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    let handle = spawn_scheduler(
        SchedulerCfg {
            interval_secs: cfg.interval_secs,
            merge_key: cfg.merge_key,
        },
        source,
        store,
    );
    tokio::select! {
        res = handle => res.context("scheduler task ended")?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutdown requested"),
    }
    Ok(())
}
