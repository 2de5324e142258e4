// src/merge.rs
//! Merge engine: reconcile the persisted snapshot with a freshly normalized batch.
//!
//! Rules:
//! - records are matched on one key field (`id`, or legacy `fingerprint`)
//! - matched: fresh fields overwrite, stale-only fields are kept
//! - array/object values are replaced wholesale, never merged element-wise
//! - unmatched fresh records are appended in fresh order
//! - nothing is ever removed
//!
//! A stale snapshot that already holds duplicate keys is collapsed (first
//! position, later fields win) even when `fresh` is empty, so the output is
//! only identical to a stale input whose keys are unique.

use std::fmt;
use std::str::FromStr;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{MergeConfigurationError, PipelineError};
use crate::event::{Event, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MergeKey {
    #[default]
    Id,
    /// Only for snapshots written before ids were reliable.
    Fingerprint,
}

impl MergeKey {
    pub fn field(self) -> &'static str {
        match self {
            MergeKey::Id => "id",
            MergeKey::Fingerprint => "fingerprint",
        }
    }

    fn of(self, record: &Record) -> Option<&str> {
        record.get(self.field()).and_then(Value::as_str)
    }
}

impl fmt::Display for MergeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

impl FromStr for MergeKey {
    type Err = MergeConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(MergeKey::Id),
            "fingerprint" => Ok(MergeKey::Fingerprint),
            _ => Err(MergeConfigurationError::UnknownKey(s.to_string())),
        }
    }
}

/// Stale rows without the key field cannot be matched but still have to
/// survive, so they get a positional slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    Keyed(String),
    Unkeyed(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub records: Vec<Record>,
    /// Fresh records with a key not seen before.
    pub inserted: usize,
    /// Fresh records that matched an existing key.
    pub matched: usize,
    /// Matched records where at least one field value actually changed.
    pub changed: usize,
}

/// Merge `fresh` into `stale`, keyed by `key`.
pub fn merge_records(
    stale: Vec<Record>,
    fresh: Vec<Record>,
    key: MergeKey,
) -> Result<MergeOutcome, MergeConfigurationError> {
    let mut map: IndexMap<Slot, Record> = IndexMap::with_capacity(stale.len() + fresh.len());
    for (pos, rec) in stale.into_iter().enumerate() {
        let slot = match key.of(&rec) {
            Some(k) => Slot::Keyed(k.to_string()),
            None => Slot::Unkeyed(pos),
        };
        match map.entry(slot) {
            Entry::Occupied(mut e) => {
                tracing::debug!(target: "merge", key = %key, "duplicate key in stale snapshot");
                overlay(e.get_mut(), rec);
            }
            Entry::Vacant(e) => {
                e.insert(rec);
            }
        }
    }

    let mut outcome = MergeOutcome::default();
    for (index, rec) in fresh.into_iter().enumerate() {
        let k = key
            .of(&rec)
            .ok_or(MergeConfigurationError::FreshRecordWithoutKey {
                index,
                key: key.field(),
            })?
            .to_string();
        match map.entry(Slot::Keyed(k)) {
            Entry::Occupied(mut e) => {
                outcome.matched += 1;
                if overlay(e.get_mut(), rec) {
                    outcome.changed += 1;
                }
            }
            Entry::Vacant(e) => {
                outcome.inserted += 1;
                e.insert(rec);
            }
        }
    }

    outcome.records = map.into_values().collect();
    Ok(outcome)
}

/// Convenience wrapper for a normalized batch.
pub fn merge_events(
    stale: Vec<Record>,
    fresh: &[Event],
    key: MergeKey,
) -> Result<MergeOutcome, PipelineError> {
    let fresh = fresh
        .iter()
        .map(Event::to_record)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(merge_records(stale, fresh, key)?)
}

/// Field-level union favoring `fresh`. Existing fields keep their position,
/// new ones are appended. Returns whether anything changed.
fn overlay(target: &mut Record, fresh: Record) -> bool {
    let mut changed = false;
    for (field, value) in fresh {
        match target.get_mut(&field) {
            // sequences and mappings included: the whole value is swapped
            Some(cur) => {
                if *cur != value {
                    *cur = value;
                    changed = true;
                }
            }
            None => {
                target.insert(field, value);
                changed = true;
            }
        }
    }
    changed
}
