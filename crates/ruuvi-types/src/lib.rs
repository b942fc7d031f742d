//! Platform-agnostic types for Ruuvi environmental sensor readings.
//!
//! This crate provides the shared reading model used by the storage layer
//! (ruuvi-store) and the retention engine (ruuvi-retention).
//!
//! # Features
//!
//! - [`Reading`], a single timestamped observation with nullable metrics
//! - Millisecond time constants and conversions to [`time::OffsetDateTime`]
//! - Error types for timestamp parsing
//!
//! # Example
//!
//! ```
//! use ruuvi_types::{Reading, MINUTE_MS};
//!
//! let reading = Reading::new("C4:D9:12:AA:01:02", 10 * MINUTE_MS)
//!     .with_temperature(21.5)
//!     .with_battery(2.9);
//! assert_eq!(reading.humidity, None);
//! ```

pub mod error;
pub mod timestamp;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use timestamp::{DAY_MS, HOUR_MS, MINUTE_MS, SECOND_MS};
pub use types::Reading;
