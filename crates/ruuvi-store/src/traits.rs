//! Trait abstraction over reading storage.
//!
//! [`ReadingStore`] is the narrow surface the retention engine needs from
//! storage: enumerate sensors, scan a half-open time range, and atomically
//! swap groups of readings for their aggregates. [`Store`](crate::Store)
//! implements it over SQLite and [`MemoryStore`](crate::MemoryStore) over a
//! plain vector for tests.
//!
//! # Example
//!
//! ```
//! use ruuvi_store::{MemoryStore, ReadingStore};
//! use ruuvi_types::Reading;
//!
//! fn sensor_count<S: ReadingStore>(store: &S) -> usize {
//!     store.list_sensor_ids().map(|ids| ids.len()).unwrap_or(0)
//! }
//!
//! let mut store = MemoryStore::new();
//! store.insert(Reading::new("S1", 0));
//! assert_eq!(sensor_count(&store), 1);
//! ```

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::models::{BucketReplacement, StoredReading};

/// Storage operations used by the retention engine.
pub trait ReadingStore {
    /// List the distinct sensor identifiers that have at least one reading.
    fn list_sensor_ids(&self) -> Result<BTreeSet<String>>;

    /// Read all readings for `sensor_id` with `start <= timestamp < end`.
    ///
    /// Results are ordered by timestamp ascending, ties by row ID.
    fn read_range(&self, sensor_id: &str, start: i64, end: i64) -> Result<Vec<StoredReading>>;

    /// Apply every replacement as one all-or-nothing unit of work.
    ///
    /// Each replacement deletes its listed readings and inserts its
    /// aggregate. If any part fails, none of it is applied. An empty slice
    /// is a no-op.
    fn replace_buckets(&mut self, replacements: &[BucketReplacement]) -> Result<()>;
}

impl<S: ReadingStore + ?Sized> ReadingStore for &mut S {
    fn list_sensor_ids(&self) -> Result<BTreeSet<String>> {
        (**self).list_sensor_ids()
    }

    fn read_range(&self, sensor_id: &str, start: i64, end: i64) -> Result<Vec<StoredReading>> {
        (**self).read_range(sensor_id, start, end)
    }

    fn replace_buckets(&mut self, replacements: &[BucketReplacement]) -> Result<()> {
        (**self).replace_buckets(replacements)
    }
}

impl<S: ReadingStore + ?Sized> ReadingStore for Box<S> {
    fn list_sensor_ids(&self) -> Result<BTreeSet<String>> {
        (**self).list_sensor_ids()
    }

    fn read_range(&self, sensor_id: &str, start: i64, end: i64) -> Result<Vec<StoredReading>> {
        (**self).read_range(sensor_id, start, end)
    }

    fn replace_buckets(&mut self, replacements: &[BucketReplacement]) -> Result<()> {
        (**self).replace_buckets(replacements)
    }
}

/// A store that may not have been opened yet.
///
/// `None` answers every operation with [`Error::Unavailable`].
impl<S: ReadingStore> ReadingStore for Option<S> {
    fn list_sensor_ids(&self) -> Result<BTreeSet<String>> {
        self.as_ref().ok_or(Error::Unavailable)?.list_sensor_ids()
    }

    fn read_range(&self, sensor_id: &str, start: i64, end: i64) -> Result<Vec<StoredReading>> {
        self.as_ref()
            .ok_or(Error::Unavailable)?
            .read_range(sensor_id, start, end)
    }

    fn replace_buckets(&mut self, replacements: &[BucketReplacement]) -> Result<()> {
        self.as_mut()
            .ok_or(Error::Unavailable)?
            .replace_buckets(replacements)
    }
}
