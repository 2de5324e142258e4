// src/identify.rs
//! Identifier computer: UTC instant -> feed-local `YYYYMMDDHHMMSS`.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

use crate::error::NormalizationError;
use crate::event::{format_occurred_at, EventId};

/// Feed-local civil time is UTC+7 all year (no DST).
pub const LOCAL_OFFSET_SECS: i32 = 7 * 3600;

pub fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(LOCAL_OFFSET_SECS).expect("UTC+7 is within +-24h")
}

/// Local year must fit four digits for the id to stay 14 chars wide.
pub fn local_year_supported(occurred_at: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&occurred_at.with_timezone(&local_offset()).year())
}

/// Build the event id. Sub-second precision is dropped.
///
/// Fails only when the local year does not fit four digits.
pub fn event_id(occurred_at: &DateTime<Utc>) -> Result<EventId, NormalizationError> {
    if !local_year_supported(occurred_at) {
        return Err(NormalizationError::YearOutOfRange(format_occurred_at(
            occurred_at,
        )));
    }
    let local = occurred_at.with_timezone(&local_offset());
    Ok(EventId::from_digits(format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        local.year(),
        local.month(),
        local.day(),
        local.hour(),
        local.minute(),
        local.second()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn shifts_into_next_local_day() {
        assert_eq!(
            event_id(&utc("2022-12-18T22:50:14.000Z")).unwrap().as_str(),
            "20221219055014"
        );
    }

    #[test]
    fn pads_every_component() {
        assert_eq!(
            event_id(&utc("2022-01-09T02:03:05.000Z")).unwrap().as_str(),
            "20220109090305"
        );
    }

    #[test]
    fn rolls_over_year_end() {
        assert_eq!(
            event_id(&utc("2022-12-31T17:00:00Z")).unwrap().as_str(),
            "20230101000000"
        );
    }

    #[test]
    fn ignores_sub_second_part() {
        let a = utc("2023-02-02T10:11:12.000Z");
        let b = utc("2023-02-02T10:11:12.999Z");
        assert_eq!(event_id(&a).unwrap(), event_id(&b).unwrap());
    }

    #[test]
    fn monotonic_per_second() {
        let start = Utc.with_ymd_and_hms(2021, 6, 30, 16, 59, 50).unwrap();
        let mut prev: Option<u64> = None;
        for s in 0..40 {
            let id = event_id(&(start + Duration::seconds(s))).unwrap();
            assert_eq!(id.as_str().len(), 14);
            let n: u64 = id.as_str().parse().unwrap();
            if let Some(p) = prev {
                assert!(n > p, "{n} should follow {p}");
            }
            prev = Some(n);
        }
    }

    #[test]
    fn five_digit_local_year_is_rejected() {
        let t = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            event_id(&t),
            Err(NormalizationError::YearOutOfRange(_))
        ));
        // UTC still 9999, local already 10000
        assert!(event_id(&utc("9999-12-31T17:00:00Z")).is_err());
        assert_eq!(
            event_id(&utc("9999-12-31T16:59:59Z")).unwrap().as_str(),
            "99991231235959"
        );
    }

    #[test]
    fn negative_year_is_rejected() {
        let t = Utc.with_ymd_and_hms(-1, 6, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            event_id(&t),
            Err(NormalizationError::YearOutOfRange(_))
        ));
    }

    #[test]
    fn year_support_follows_local_calendar() {
        assert!(local_year_supported(&utc("9999-12-31T16:59:59Z")));
        assert!(!local_year_supported(&utc("9999-12-31T17:00:00Z")));
    }
}
