// tests/metrics_ingest.rs
#![cfg(feature = "strict-metrics")]
use chrono::{TimeZone, Utc};
use metrics_exporter_prometheus::PrometheusBuilder;
use quake_feed_sync::ingest::{self, providers::bmkg::BmkgFeed, store::MemoryStore};
use quake_feed_sync::MergeKey;

#[tokio::test]
async fn metrics_exposed_after_cycle() {
    // Install a local recorder for the test
    let handle = PrometheusBuilder::new().install_recorder().expect("recorder");

    let feed = BmkgFeed::from_fixture(include_str!("fixtures/gempadirasakan.json"));
    let store = MemoryStore::new(vec![]);
    let now = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    ingest::run_cycle(&feed, &store, MergeKey::Id, now)
        .await
        .expect("cycle ok");

    let out = handle.render();
    assert!(out.contains("feed_entries_total"));
    assert!(out.contains("merge_inserted_total"));
    assert!(out.contains("pipeline_runs_total"));
    assert!(out.contains("pipeline_last_run_ts"));
}
