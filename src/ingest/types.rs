// src/ingest/types.rs
use anyhow::Result;

use crate::event::Record;

/// Where the raw agency document comes from.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Raw body, unparsed. No retries; a failure aborts the cycle.
    async fn fetch_raw(&self) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// Persisted snapshot. The pipeline assumes a single writer.
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Current snapshot; an absent snapshot is empty.
    async fn load(&self) -> Result<Vec<Record>>;
    /// Replace the snapshot with `records`.
    async fn store(&self, records: &[Record]) -> Result<()>;
}

/// Summary of one fetch/normalize/merge/store run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CycleReport {
    pub fetched: usize,
    pub anomalies: usize,
    pub inserted: usize,
    pub matched: usize,
    pub changed: usize,
    pub total: usize,
}
