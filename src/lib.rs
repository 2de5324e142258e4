// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod anomaly;
pub mod error;
pub mod event;
pub mod fingerprint;
pub mod identify;
pub mod merge;
pub mod normalize;

// Fetch / persist / schedule collaborators around the core
pub mod ingest;

// ---- Re-exports for stable public API ----
pub use crate::anomaly::detect_anomaly;
pub use crate::error::{MergeConfigurationError, NormalizationError, PipelineError, ValidationError};
pub use crate::event::{shake_map_url, Anomaly, Event, EventId, Record};
pub use crate::fingerprint::{fingerprint, FingerprintInput};
pub use crate::identify::event_id;
pub use crate::merge::{merge_events, merge_records, MergeKey, MergeOutcome};
pub use crate::normalize::{normalize_feed, normalize_feed_str};
