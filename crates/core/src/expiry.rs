//! Expiration policy for notices
//!
//! Expiry timestamps are written as `YYYY-MM-DD HH:MM:SS` in UTC. Writes must
//! land strictly after `now + buffer` so that a notice cannot be stored with
//! an expiry that reads as already passed by the time it is persisted. Reads
//! apply no buffer.

use crate::errors::{Error, Result};
use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Wire and storage format of an expiry timestamp
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static EXPIRY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").expect("expiry pattern is valid")
});

/// Parse and validate a caller-supplied expiry
pub fn parse_expiry(raw: &str, now: DateTime<Utc>, buffer: Duration) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if !EXPIRY_PATTERN.is_match(raw) {
        return Err(Error::validation(
            "expires",
            format!("'{raw}' must use the format YYYY-MM-DD HH:MM:SS"),
        ));
    }
    let parsed = NaiveDateTime::parse_from_str(raw, EXPIRY_FORMAT)
        .map_err(|e| Error::validation("expires", format!("'{raw}' is not a valid date: {e}")))?
        .and_utc();
    validate_expiry(parsed, now, buffer)?;
    Ok(parsed)
}

/// Check that an already-parsed expiry lies beyond the write buffer
pub fn validate_expiry(
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
    buffer: Duration,
) -> Result<()> {
    let earliest = now + buffer;
    if expires_at <= earliest {
        return Err(Error::validation(
            "expires",
            format!(
                "{} must be later than {}",
                format_expiry(expires_at),
                format_expiry(earliest)
            ),
        ));
    }
    Ok(())
}

/// Whether an optional expiry has passed at `now`
#[must_use]
pub fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expires_at.is_some_and(|ts| now > ts)
}

/// Drop sub-second precision, which the storage format cannot hold
#[must_use]
pub fn to_stored_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(0)
}

#[must_use]
pub fn format_expiry(ts: DateTime<Utc>) -> String {
    ts.format(EXPIRY_FORMAT).to_string()
}

/// Interpret a stored expiry value; unreadable values are treated as absent
#[must_use]
pub fn read_stored_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDateTime::parse_from_str(raw, EXPIRY_FORMAT) {
        Ok(naive) => Some(naive.and_utc()),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "ignoring unreadable stored expiry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
    }

    #[rstest]
    #[case("2030-06-01 12:00:00")] // now
    #[case("2030-06-01 11:59:59")] // past
    #[case("2030-06-01 12:01:00")] // exactly now + buffer
    fn test_rejects_inside_buffer(#[case] raw: &str) {
        let result = parse_expiry(raw, now(), Duration::seconds(60));
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_accepts_one_second_past_buffer() {
        let parsed = parse_expiry("2030-06-01 12:01:01", now(), Duration::seconds(60)).unwrap();
        assert_eq!(parsed, now() + Duration::seconds(61));
    }

    #[test]
    fn test_stored_precision_matches_round_trip() {
        let precise = now() + Duration::milliseconds(1_750);
        let stored = to_stored_precision(precise);
        assert_eq!(stored, now() + Duration::seconds(1));
        assert_eq!(read_stored_expiry(&format_expiry(precise)), Some(stored));
    }

    #[rstest]
    #[case("2030-6-1 12:00:00")]
    #[case("2030-06-01T13:00:00")]
    #[case("2030-06-01 13:00")]
    #[case("tomorrow")]
    #[case("")]
    fn test_rejects_wrong_format(#[case] raw: &str) {
        let err = parse_expiry(raw, now(), Duration::seconds(60)).unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD HH:MM:SS"));
    }

    #[test]
    fn test_rejects_impossible_dates() {
        let err = parse_expiry("2030-02-30 10:00:00", now(), Duration::seconds(60)).unwrap_err();
        assert!(err.to_string().contains("not a valid date"));
    }

    #[test]
    fn test_read_time_has_no_buffer() {
        let ts = now();
        assert!(!is_expired(Some(ts), ts));
        assert!(is_expired(Some(ts), ts + Duration::seconds(1)));
        assert!(!is_expired(None, ts + Duration::days(365)));
    }

    #[test]
    fn test_stored_expiry_round_trips_through_format() {
        let ts = now();
        assert_eq!(read_stored_expiry(&format_expiry(ts)), Some(ts));
        assert_eq!(read_stored_expiry("garbage"), None);
        assert_eq!(read_stored_expiry(""), None);
    }
}
