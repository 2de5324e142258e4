// src/error.rs
//! Typed errors for the normalize/merge core. Boundary code wraps these in `anyhow`.

use thiserror::Error;

/// Raw feed failed structural or format validation. Fatal for the whole batch.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("feed document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feed document has no `gempa` entry list")]
    MissingEntries,

    #[error("feed `gempa` must be an array or a single entry object")]
    EntriesNotAList,

    #[error("entry {index}: expected an object")]
    EntryNotAnObject { index: usize },

    #[error("entry {index}: field `{field}` is missing")]
    MissingField { index: usize, field: &'static str },

    #[error("entry {index}: field `{field}` must be a string")]
    NotAString { index: usize, field: &'static str },

    #[error("entry {index}: field `{field}` is malformed ({reason}): {value:?}")]
    Malformed {
        index: usize,
        field: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// A value passed structural validation but breaks a record invariant.
#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("entry {index}: {field} = {value} is outside {min}..={max}")]
    OutOfRange {
        index: usize,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("entry {index}: {field} must be finite")]
    NotFinite { index: usize, field: &'static str },

    #[error("timestamp {0} has a local year outside 0000..=9999")]
    YearOutOfRange(String),

    #[error("invalid event id {0:?}: expected 14 ASCII digits")]
    InvalidId(String),

    #[error("event could not be encoded as a record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("event is not a JSON object after encoding")]
    NotAnObject,
}

/// Caller asked the merge engine for something it cannot do.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeConfigurationError {
    #[error("unknown merge key {0:?} (expected `id` or `fingerprint`)")]
    UnknownKey(String),

    #[error("fresh record {index} has no string `{key}` field")]
    FreshRecordWithoutKey { index: usize, key: &'static str },
}

/// Umbrella for everything the core can report to a caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
    #[error(transparent)]
    MergeConfiguration(#[from] MergeConfigurationError),
}
