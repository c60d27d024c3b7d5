use chrono::{NaiveDate, NaiveDateTime};

use crate::types::Timestamp;
use crate::types::errors::TimestampError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses either a full ISO-8601 date-time or a bare date.
///
/// A bare date resolves to midnight, so `2023-11-05` used as an inclusive upper
/// bound does not cover transactions later that same day.
pub fn parse_timestamp(value: &str) -> Result<Timestamp, TimestampError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(TimestampError::Empty);
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(timestamp);
        }
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .map_err(|error| TimestampError::InvalidFormat(format!("'{value}' is not a date or date-time: {error}")))
}
