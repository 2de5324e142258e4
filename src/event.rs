// src/event.rs
//! Canonical normalized earthquake record and its identifier newtype.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NormalizationError;

/// Persisted snapshot row. Kept as a JSON object so fields unknown to `Event`
/// (older snapshot layouts, hand edits) survive a merge.
pub type Record = serde_json::Map<String, serde_json::Value>;

pub const SHAKE_MAP_BASE_URL: &str = "https://data.bmkg.go.id/DataMKG/TEWS/";
pub const SHAKE_MAP_SUFFIX: &str = "mmi.jpg";

/// 14-digit `YYYYMMDDHHMMSS` identifier in feed-local time (UTC+7).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventId(String);

impl EventId {
    pub const LEN: usize = 14;

    /// Checked constructor.
    pub fn parse(s: impl Into<String>) -> Result<Self, NormalizationError> {
        let s = s.into();
        if s.len() == Self::LEN && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s))
        } else {
            Err(NormalizationError::InvalidId(s))
        }
    }

    /// For callers that produced the digits themselves (see `identify`).
    pub(crate) fn from_digits(s: String) -> Self {
        debug_assert!(s.len() == Self::LEN && s.bytes().all(|b| b.is_ascii_digit()));
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EventId {
    type Error = NormalizationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.0
    }
}

/// Known data-quality issues. Tags only; the record is kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Anomaly {
    /// `occurredAt` lies after the reference instant used during normalization.
    FutureEvent,
}

impl Anomaly {
    pub fn code(self) -> &'static str {
        match self {
            Anomaly::FutureEvent => "FUTURE_EVENT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub fingerprint: String,
    #[serde(with = "iso_millis")]
    pub occurred_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub magnitude: f64,
    pub depth_km: f64,
    pub location_text: String,
    pub felt_stations_text: String,
    pub shake_map_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<Anomaly>,
}

impl Event {
    /// Encode as a snapshot row (field order follows the struct).
    pub fn to_record(&self) -> Result<Record, NormalizationError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(NormalizationError::NotAnObject),
        }
    }
}

/// Shake-map image location for an event. Pure string template.
pub fn shake_map_url(id: &EventId) -> String {
    format!("{SHAKE_MAP_BASE_URL}{id}.{SHAKE_MAP_SUFFIX}")
}

/// `2022-12-18T22:50:14.000Z`: millisecond precision, explicit zero offset.
pub fn format_occurred_at(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_occurred_at(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
