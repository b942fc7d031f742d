//! Error types for data parsing in ruuvi-types.

use thiserror::Error;

/// Errors that can occur when interpreting Ruuvi reading data.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// A millisecond timestamp could not be represented as a calendar date.
    #[error("Timestamp {0} ms is out of range")]
    TimestampOutOfRange(i64),

    /// A textual timestamp could not be parsed.
    #[error("Invalid timestamp '{0}': expected RFC 3339 (e.g. 2024-05-01T12:00:00Z)")]
    InvalidTimestamp(String),
}

/// Result type alias using ruuvi-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
