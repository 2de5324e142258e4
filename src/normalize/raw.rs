// src/normalize/raw.rs
//! Raw feed shape: envelope lookup, per-entry validation and field parsers.
//!
//! The agency publishes every value as a string, e.g.
//! `{"DateTime":"2022-12-18T22:50:14+00:00","Coordinates":"-8.06,119.24",
//!   "Magnitude":"4.9","Kedalaman":"10 km","Wilayah":"...","Dirasakan":"..."}`.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::ValidationError;
use crate::identify::local_year_supported;

pub const FIELD_DATETIME: &str = "DateTime";
pub const FIELD_COORDINATES: &str = "Coordinates";
pub const FIELD_MAGNITUDE: &str = "Magnitude";
pub const FIELD_DEPTH: &str = "Kedalaman";
pub const FIELD_LOCATION: &str = "Wilayah";
pub const FIELD_FELT: &str = "Dirasakan";
/// Optional; the agency's own shake-map file name, only used as a cross-check.
pub const FIELD_SHAKEMAP: &str = "Shakemap";

const ENVELOPE: &str = "Infogempa";
const ENTRIES: &str = "gempa";
const DEPTH_UNIT: &str = " km";

/// Reason a single field string failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadFormat(pub &'static str);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Locate the entry list. Accepts `{"gempa": [...]}`, the agency envelope
/// `{"Infogempa": {"gempa": [...]}}`, and a lone entry object in place of the
/// array (the latest-event feed).
pub fn entries(doc: &Value) -> Result<Vec<&Value>, ValidationError> {
    let root = doc.get(ENVELOPE).unwrap_or(doc);
    match root.get(ENTRIES) {
        Some(Value::Array(items)) => Ok(items.iter().collect()),
        Some(obj @ Value::Object(_)) => Ok(vec![obj]),
        Some(_) => Err(ValidationError::EntriesNotAList),
        None => Err(ValidationError::MissingEntries),
    }
}

/// `"<lat>,<lon>"`, signs carried by the numbers themselves.
pub fn parse_coordinates(s: &str) -> Result<Coordinates, BadFormat> {
    let mut parts = s.split(',');
    let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(BadFormat("expected `<lat>,<lon>`"));
    };
    let latitude = parse_decimal(lat).ok_or(BadFormat("latitude is not a decimal"))?;
    let longitude = parse_decimal(lon).ok_or(BadFormat("longitude is not a decimal"))?;
    Ok(Coordinates {
        latitude,
        longitude,
    })
}

/// `"30 km"` -> `30.0`.
pub fn parse_depth_km(s: &str) -> Result<f64, BadFormat> {
    let number = s
        .trim()
        .strip_suffix(DEPTH_UNIT)
        .ok_or(BadFormat("expected `<number> km`"))?;
    parse_decimal(number).ok_or(BadFormat("depth is not a decimal"))
}

pub fn parse_magnitude(s: &str) -> Result<f64, BadFormat> {
    parse_decimal(s).ok_or(BadFormat("magnitude is not a decimal"))
}

/// ISO-8601 with explicit offset; converted to UTC.
pub fn parse_occurred_at(s: &str) -> Result<DateTime<Utc>, BadFormat> {
    let t = DateTime::parse_from_rfc3339(s.trim())
        .map_err(|_| BadFormat("expected ISO-8601 date-time with UTC offset"))?
        .with_timezone(&Utc);
    if !local_year_supported(&t) {
        return Err(BadFormat("local year outside 0000..=9999"));
    }
    Ok(t)
}

fn parse_decimal(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok()
}

/// An entry whose fields all have the right type and syntax.
/// Value ranges are checked later, when the `Event` is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEntry {
    pub index: usize,
    pub occurred_at: DateTime<Utc>,
    pub coordinates: Coordinates,
    pub magnitude: f64,
    pub depth_km: f64,
    pub location_text: String,
    pub felt_stations_text: String,
    pub shake_map_hint: Option<String>,
}

impl ValidEntry {
    pub fn validate(index: usize, entry: &Value) -> Result<Self, ValidationError> {
        let Value::Object(_) = entry else {
            return Err(ValidationError::EntryNotAnObject { index });
        };

        let occurred_at = parse_field(index, entry, FIELD_DATETIME, parse_occurred_at)?;
        let coordinates = parse_field(index, entry, FIELD_COORDINATES, parse_coordinates)?;
        let magnitude = parse_field(index, entry, FIELD_MAGNITUDE, parse_magnitude)?;
        let depth_km = parse_field(index, entry, FIELD_DEPTH, parse_depth_km)?;
        let location_text = required_str(index, entry, FIELD_LOCATION)?.to_string();
        let felt_stations_text = required_str(index, entry, FIELD_FELT)?.to_string();
        let shake_map_hint = entry
            .get(FIELD_SHAKEMAP)
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            index,
            occurred_at,
            coordinates,
            magnitude,
            depth_km,
            location_text,
            felt_stations_text,
            shake_map_hint,
        })
    }
}

fn required_str<'a>(
    index: usize,
    entry: &'a Value,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match entry.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField { index, field }),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationError::NotAString { index, field }),
    }
}

fn parse_field<T>(
    index: usize,
    entry: &Value,
    field: &'static str,
    parse: impl FnOnce(&str) -> Result<T, BadFormat>,
) -> Result<T, ValidationError> {
    let raw = required_str(index, entry, field)?;
    parse(raw).map_err(|BadFormat(reason)| ValidationError::Malformed {
        index,
        field,
        value: raw.to_string(),
        reason,
    })
}
