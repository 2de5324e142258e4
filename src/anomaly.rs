// src/anomaly.rs
//! Data-quality tagging. The agency feed sometimes ships a wrong year; there is
//! no safe automatic fix, so such records are flagged for manual review.

use chrono::{DateTime, Utc};

use crate::event::Anomaly;

/// `FutureEvent` iff `occurred_at` is strictly after `now`.
/// `now` is always supplied by the caller.
pub fn detect_anomaly(occurred_at: &DateTime<Utc>, now: &DateTime<Utc>) -> Option<Anomaly> {
    (occurred_at > now).then_some(Anomaly::FutureEvent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn future_timestamp_is_flagged() {
        let now = Utc.with_ymd_and_hms(2023, 1, 5, 0, 0, 0).unwrap();
        // typical feed glitch: year bumped by one
        let ev = Utc.with_ymd_and_hms(2024, 1, 4, 23, 0, 0).unwrap();
        assert_eq!(detect_anomaly(&ev, &now), Some(Anomaly::FutureEvent));
    }

    #[test]
    fn past_and_equal_are_clean() {
        let now = Utc.with_ymd_and_hms(2023, 1, 5, 0, 0, 0).unwrap();
        assert_eq!(detect_anomaly(&(now - Duration::seconds(1)), &now), None);
        assert_eq!(detect_anomaly(&now, &now), None);
    }

    #[test]
    fn one_millisecond_ahead_counts() {
        let now = Utc.with_ymd_and_hms(2023, 1, 5, 0, 0, 0).unwrap();
        assert!(detect_anomaly(&(now + Duration::milliseconds(1)), &now).is_some());
    }
}
