// src/ingest/mod.rs
//! Boundary around the core: fetch the raw feed, load the snapshot, merge,
//! write the snapshot back. One writer at a time.

pub mod config;
pub mod providers;
pub mod scheduler;
pub mod store;
pub mod types;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::ingest::types::{CycleReport, FeedSource, SnapshotStore};
use crate::merge::{merge_events, MergeKey};
use crate::normalize::normalize_feed_str;

/// One-time metrics registration (so series show up on a recorder's scrape).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_entries_total", "Entries normalized from the feed.");
        describe_counter!(
            "feed_anomalies_total",
            "Normalized entries carrying an anomaly tag."
        );
        describe_counter!("feed_fetch_errors_total", "Feed fetch failures.");
        describe_histogram!("feed_fetch_ms", "Feed fetch time in milliseconds.");
        describe_histogram!("feed_normalize_ms", "Normalization time in milliseconds.");
        describe_counter!("merge_inserted_total", "Fresh events new to the snapshot.");
        describe_counter!(
            "merge_updated_total",
            "Persisted events whose fields changed on merge."
        );
        describe_counter!("pipeline_runs_total", "Completed pipeline cycles.");
        describe_counter!("pipeline_failures_total", "Aborted pipeline cycles.");
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts of the last completed cycle."
        );
    });
}

/// Run one cycle: fetch -> normalize -> load -> merge -> store.
///
/// `now` is the reference instant for anomaly tagging. Any failure returns
/// before the store is written.
pub async fn run_cycle(
    source: &dyn FeedSource,
    store: &dyn SnapshotStore,
    merge_key: MergeKey,
    now: DateTime<Utc>,
) -> Result<CycleReport> {
    ensure_metrics_described();
    let res = run_cycle_inner(source, store, merge_key, now).await;
    match &res {
        Ok(report) => {
            counter!("pipeline_runs_total").increment(1);
            counter!("merge_inserted_total").increment(report.inserted as u64);
            counter!("merge_updated_total").increment(report.changed as u64);
            gauge!("pipeline_last_run_ts").set(now.timestamp() as f64);
        }
        Err(_) => counter!("pipeline_failures_total").increment(1),
    }
    res
}

async fn run_cycle_inner(
    source: &dyn FeedSource,
    store: &dyn SnapshotStore,
    merge_key: MergeKey,
    now: DateTime<Utc>,
) -> Result<CycleReport> {
    let body = source
        .fetch_raw()
        .await
        .with_context(|| format!("fetching feed from {}", source.name()))?;
    let fresh = normalize_feed_str(&body, now)
        .with_context(|| format!("normalizing feed from {}", source.name()))?;
    let stale = store.load().await.context("loading snapshot")?;
    let outcome = merge_events(stale, &fresh, merge_key).context("merging snapshot")?;
    store
        .store(&outcome.records)
        .await
        .context("writing snapshot")?;

    let report = CycleReport {
        fetched: fresh.len(),
        anomalies: fresh.iter().filter(|e| e.anomaly.is_some()).count(),
        inserted: outcome.inserted,
        matched: outcome.matched,
        changed: outcome.changed,
        total: outcome.records.len(),
    };
    tracing::info!(
        target: "ingest",
        provider = source.name(),
        key = %merge_key,
        fetched = report.fetched,
        anomalies = report.anomalies,
        inserted = report.inserted,
        changed = report.changed,
        total = report.total,
        "snapshot updated"
    );
    Ok(report)
}
