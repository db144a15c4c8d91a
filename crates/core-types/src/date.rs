use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Naive date-time layouts accepted in addition to RFC 3339.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parses an ISO-8601-like timestamp into UTC.
///
/// Strings carrying an offset (or `Z`) are converted to UTC. Naive date-times
/// and plain dates are taken to already be in UTC, dates at midnight.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(naive.and_utc());
            }
        }
    }

    Err(CoreError::InvalidDate(
        raw.to_string(),
        "unrecognised date format".to_string(),
    ))
}
