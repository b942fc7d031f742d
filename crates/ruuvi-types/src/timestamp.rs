//! Millisecond time helpers.
//!
//! Readings are keyed by milliseconds since the Unix epoch. These helpers
//! convert to and from [`OffsetDateTime`] at the edges (CLI input, log and
//! report output) so the storage and bucketing code can stay on plain `i64`.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{ParseError, ParseResult};

/// One second in milliseconds.
pub const SECOND_MS: i64 = 1_000;
/// One minute in milliseconds.
pub const MINUTE_MS: i64 = 60 * SECOND_MS;
/// One hour in milliseconds.
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
/// One day in milliseconds.
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Convert an [`OffsetDateTime`] to milliseconds since the Unix epoch.
///
/// Sub-millisecond precision is truncated toward negative infinity.
#[must_use]
pub fn to_millis(datetime: OffsetDateTime) -> i64 {
    (datetime.unix_timestamp_nanos().div_euclid(1_000_000)) as i64
}

/// Convert milliseconds since the Unix epoch to an [`OffsetDateTime`] in UTC.
///
/// # Examples
///
/// ```
/// use ruuvi_types::timestamp::from_millis;
///
/// let dt = from_millis(0).unwrap();
/// assert_eq!(dt, time::OffsetDateTime::UNIX_EPOCH);
/// ```
pub fn from_millis(millis: i64) -> ParseResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|_| ParseError::TimestampOutOfRange(millis))
}

/// Parse an RFC 3339 timestamp into milliseconds since the Unix epoch.
///
/// # Examples
///
/// ```
/// use ruuvi_types::timestamp::parse_rfc3339_millis;
///
/// assert_eq!(parse_rfc3339_millis("1970-01-01T00:00:01Z").unwrap(), 1_000);
/// assert!(parse_rfc3339_millis("not a date").is_err());
/// ```
pub fn parse_rfc3339_millis(input: &str) -> ParseResult<i64> {
    OffsetDateTime::parse(input.trim(), &Rfc3339)
        .map(to_millis)
        .map_err(|_| ParseError::InvalidTimestamp(input.to_string()))
}

/// Format milliseconds since the Unix epoch as RFC 3339.
///
/// Falls back to the raw millisecond value when the timestamp cannot be
/// represented, so this is safe to use in log lines.
#[must_use]
pub fn format_millis(millis: i64) -> String {
    from_millis(millis)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| format!("{}ms", millis))
}
