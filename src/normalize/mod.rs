// src/normalize/mod.rs
//! Feed normalizer: raw agency document -> ordered `Event`s.
//!
//! All-or-nothing per batch: the first invalid entry aborts the whole run.

pub mod raw;

use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde_json::Value;

use crate::anomaly::detect_anomaly;
use crate::error::{NormalizationError, PipelineError};
use crate::event::{format_occurred_at, shake_map_url, Event, EventId, SHAKE_MAP_SUFFIX};
use crate::fingerprint::{fingerprint, FingerprintInput};
use crate::identify::event_id;

pub use raw::{
    parse_coordinates, parse_depth_km, parse_magnitude, parse_occurred_at, Coordinates,
    ValidEntry,
};

/// Parse and normalize a raw feed body.
pub fn normalize_feed_str(body: &str, now: DateTime<Utc>) -> Result<Vec<Event>, PipelineError> {
    let doc: Value = serde_json::from_str(body).map_err(crate::error::ValidationError::from)?;
    normalize_feed(&doc, now)
}

/// Normalize every entry of `doc` in input order. `now` is the reference
/// instant for anomaly tagging.
pub fn normalize_feed(doc: &Value, now: DateTime<Utc>) -> Result<Vec<Event>, PipelineError> {
    crate::ingest::ensure_metrics_described();
    let t0 = std::time::Instant::now();

    let items = raw::entries(doc)?;
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let entry = ValidEntry::validate(index, item)?;
        out.push(build_event(entry, &now)?);
    }

    let anomalies = out.iter().filter(|e| e.anomaly.is_some()).count();
    histogram!("feed_normalize_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("feed_entries_total").increment(out.len() as u64);
    counter!("feed_anomalies_total").increment(anomalies as u64);
    tracing::debug!(target: "ingest", entries = out.len(), anomalies, "feed normalized");

    Ok(out)
}

/// Check value ranges and assemble the canonical record.
pub fn build_event(entry: ValidEntry, now: &DateTime<Utc>) -> Result<Event, NormalizationError> {
    let ValidEntry {
        index,
        occurred_at,
        coordinates: Coordinates {
            latitude,
            longitude,
        },
        magnitude,
        depth_km,
        location_text,
        felt_stations_text,
        shake_map_hint,
    } = entry;

    let latitude = in_range(index, "latitude", latitude, -90.0, 90.0)?;
    let longitude = in_range(index, "longitude", longitude, -180.0, 180.0)?;
    let magnitude = in_range(index, "magnitude", magnitude, 0.0, f64::MAX)?;
    let depth_km = in_range(index, "depthKm", depth_km, 0.0, f64::MAX)?;

    let id = event_id(&occurred_at)?;
    let occurred_iso = format_occurred_at(&occurred_at);
    let fingerprint = fingerprint(&FingerprintInput {
        occurred_at: &occurred_iso,
        latitude,
        longitude,
        magnitude,
        depth_km,
    });
    let anomaly = detect_anomaly(&occurred_at, now);
    if let Some(a) = anomaly {
        tracing::warn!(
            target: "ingest",
            index,
            %id,
            occurred_at = %occurred_iso,
            reference = %format_occurred_at(now),
            anomaly = a.code(),
            "feed entry flagged"
        );
    }

    if let Some(hint) = shake_map_hint.as_deref() {
        if shake_map_mismatch(hint, &id) {
            tracing::warn!(
                target: "ingest",
                index,
                %id,
                feed_shakemap = hint,
                "feed shake-map name disagrees with computed id"
            );
        }
    }

    Ok(Event {
        shake_map_url: shake_map_url(&id),
        id,
        fingerprint,
        occurred_at,
        latitude,
        longitude,
        magnitude,
        depth_km,
        location_text,
        felt_stations_text,
        anomaly,
    })
}

/// The feed's own `Shakemap` name disagrees with `<id>.mmi.jpg`.
/// Diagnostic only; the record is built from the computed id regardless.
fn shake_map_mismatch(hint: &str, id: &EventId) -> bool {
    hint.trim() != format!("{id}.{SHAKE_MAP_SUFFIX}")
}

fn in_range(
    index: usize,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, NormalizationError> {
    if !value.is_finite() {
        return Err(NormalizationError::NotFinite { index, field });
    }
    if value < min || value > max {
        return Err(NormalizationError::OutOfRange {
            index,
            field,
            value,
            min,
            max,
        });
    }
    Ok(value)
}
