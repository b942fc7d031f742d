//! Retention and downsampling for stored Ruuvi sensor readings.
//!
//! Raw readings arrive about once a minute per sensor. To keep the store
//! bounded, a retention run periodically collapses older readings into
//! coarser time-bucketed aggregates:
//!
//! | Age                 | Bucket width |
//! |---------------------|--------------|
//! | older than 7 days   | 1 hour       |
//! | 24 hours to 7 days  | 5 minutes    |
//! | under 24 hours      | untouched    |
//!
//! Each aggregate averages temperature, humidity and pressure over the
//! values present in its bucket and keeps the lowest battery voltage. A
//! bucket that already holds a single reading is left alone, so running
//! twice in a row changes nothing the second time.
//!
//! # Example
//!
//! ```
//! use ruuvi_retention::{Retention, RetentionPolicy};
//! use ruuvi_store::Store;
//!
//! let store = Store::open_in_memory()?;
//! let mut retention = Retention::new(store, RetentionPolicy::default());
//!
//! // The caller owns the clock
//! let report = retention.run(1_700_000_000_000)?;
//! assert!(report.is_success());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;

mod aggregate;
mod bucket;
mod driver;
mod error;
mod policy;
mod report;
mod rewriter;
mod sensors;

pub use aggregate::aggregate;
pub use bucket::{BucketGroup, bucket_start, group_by_bucket};
pub use config::{Config, ConfigError, ValidationError};
pub use driver::Retention;
pub use error::{Error, Result};
pub use policy::{
    EPOCH_ZERO, FIVE_MINUTES_MS, FailurePolicy, ONE_HOUR_MS, RetentionPolicy, Tier, TierWindow,
    validate_tiers,
};
pub use report::{RunReport, SensorFailure, TierReport};
pub use rewriter::{Mode, RewriteOutcome, Rewriter, plan_replacements};
pub use sensors::known_sensors;
