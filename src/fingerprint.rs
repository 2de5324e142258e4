// src/fingerprint.rs
//! Content fingerprint over the physically meaningful fields of an event.
//!
//! Descriptive text (location, felt stations) is left out so wording updates
//! from the agency do not make the same quake look new.

use sha2::{Digest, Sha256};

/// Digest width in bytes (160 bits -> 40 hex chars).
pub const FINGERPRINT_BYTES: usize = 20;

/// The exact set of hashed fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FingerprintInput<'a> {
    /// Canonical ISO string, see `event::format_occurred_at`.
    pub occurred_at: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub magnitude: f64,
    pub depth_km: f64,
}

impl FingerprintInput<'_> {
    /// `name=value` lines sorted by field name. Names are part of the preimage
    /// so swapped values hash differently.
    fn preimage(&self) -> String {
        let fields: [(&str, String); 5] = [
            ("depthKm", self.depth_km.to_string()),
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("magnitude", self.magnitude.to_string()),
            ("occurredAt", self.occurred_at.to_string()),
        ];
        debug_assert!(fields.windows(2).all(|w| w[0].0 < w[1].0));
        fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 40 lowercase hex chars.
pub fn fingerprint(input: &FingerprintInput<'_>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.preimage().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
