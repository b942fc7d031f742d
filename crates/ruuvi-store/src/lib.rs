//! Local data persistence for Ruuvi sensor readings.
//!
//! This crate provides SQLite-based storage for sensor readings along with
//! the [`ReadingStore`] trait the retention engine is written against.
//!
//! # Features
//!
//! - Append readings singly or in batches
//! - Half-open range scans per sensor, oldest first
//! - Atomic replacement of reading groups with their aggregates
//! - Query by sensor and half-open time range
//! - In-memory implementation with failure injection for tests
//!
//! # Example
//!
//! ```no_run
//! use ruuvi_store::{Store, ReadingQuery};
//!
//! let store = Store::open_default()?;
//!
//! // Readings at or after an instant, newest first
//! let query = ReadingQuery::new()
//!     .sensor("C4:D9:12:AA:01:02")
//!     .since(1_700_000_000_000);
//! let readings = store.query_readings(&query)?;
//! # Ok::<(), ruuvi_store::Error>(())
//! ```

mod error;
mod memory;
mod models;
mod queries;
mod schema;
mod store;
mod traits;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use models::{BucketReplacement, SensorStats, StoredReading};
pub use queries::ReadingQuery;
pub use store::Store;
pub use traits::ReadingStore;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/ruuvi/readings.db`
/// - macOS: `~/Library/Application Support/ruuvi/readings.db`
/// - Windows: `C:\Users\<user>\AppData\Local\ruuvi\readings.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("ruuvi")
        .join("readings.db")
}
