// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::ingest::types::{FeedSource, SnapshotStore};
use crate::merge::MergeKey;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval_secs: u64,
    pub merge_key: MergeKey,
}

/// Spawn the periodic pipeline. Ticks run strictly one after another, so the
/// snapshot only ever has one writer; a failed tick is logged and the next
/// tick starts from whatever was last written.
pub fn spawn_scheduler(
    cfg: SchedulerCfg,
    source: Arc<dyn FeedSource>,
    store: Arc<dyn SnapshotStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_secs(cfg.interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let now = chrono::Utc::now();
            match crate::ingest::run_cycle(source.as_ref(), store.as_ref(), cfg.merge_key, now)
                .await
            {
                Ok(report) => {
                    tracing::debug!(target: "ingest", ?report, "scheduled tick done");
                }
                Err(e) => {
                    tracing::warn!(target: "ingest", error = ?e, "scheduled tick failed");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::providers::bmkg::BmkgFeed;
    use crate::ingest::store::MemoryStore;

    #[tokio::test(start_paused = true)]
    async fn ticks_keep_running_after_failures() {
        let source: Arc<dyn FeedSource> = Arc::new(BmkgFeed::from_fixture("not json"));
        let store = Arc::new(MemoryStore::new(vec![]));
        let handle = spawn_scheduler(
            SchedulerCfg {
                interval_secs: 60,
                merge_key: MergeKey::Id,
            },
            source,
            store.clone(),
        );
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert!(!handle.is_finished());
        assert_eq!(store.write_count(), 0);
        handle.abort();
    }
}
