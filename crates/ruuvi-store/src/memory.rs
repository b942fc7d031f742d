//! In-memory store implementation for testing.
//!
//! [`MemoryStore`] implements [`ReadingStore`] over a plain vector so the
//! retention engine can be exercised without SQLite.
//!
//! # Features
//!
//! - **Same ordering** as the SQLite store (timestamp, then row ID)
//! - **All-or-nothing replacement**: every ID is checked before anything changes
//! - **Failure injection**: make the whole store unavailable, or fail reads or
//!   writes for specific sensors

use std::collections::{BTreeSet, HashSet};

use ruuvi_types::Reading;

use crate::error::{Error, Result};
use crate::models::{BucketReplacement, StoredReading};
use crate::traits::ReadingStore;

/// A vector-backed reading store.
///
/// # Example
///
/// ```
/// use ruuvi_store::{MemoryStore, ReadingStore};
/// use ruuvi_types::Reading;
///
/// let mut store = MemoryStore::new();
/// store.insert(Reading::new("S1", 1_000).with_temperature(20.0));
/// store.fail_replace_for("S1");
///
/// let readings = store.read_range("S1", 0, 2_000).unwrap();
/// assert_eq!(readings.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    readings: Vec<StoredReading>,
    next_id: i64,
    unavailable: bool,
    fail_reads: HashSet<String>,
    fail_replaces: HashSet<String>,
    replace_calls: usize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Insert a reading and return its assigned ID.
    pub fn insert(&mut self, reading: Reading) -> i64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.readings.push(StoredReading::from_reading(id, &reading));
        id
    }

    /// Insert many readings.
    pub fn extend<I: IntoIterator<Item = Reading>>(&mut self, readings: I) {
        for reading in readings {
            self.insert(reading);
        }
    }

    /// All stored readings, ordered by sensor, timestamp, then ID.
    pub fn readings(&self) -> Vec<StoredReading> {
        let mut readings = self.readings.clone();
        readings.sort_by(|a, b| {
            a.sensor_id
                .cmp(&b.sensor_id)
                .then(a.timestamp.cmp(&b.timestamp))
                .then(a.id.cmp(&b.id))
        });
        readings
    }

    /// Readings belonging to one sensor, ordered by timestamp then ID.
    pub fn readings_for(&self, sensor_id: &str) -> Vec<StoredReading> {
        self.readings()
            .into_iter()
            .filter(|r| r.sensor_id == sensor_id)
            .collect()
    }

    /// Number of stored readings.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Returns `true` if the store holds no readings.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Number of non-empty `replace_buckets` calls that were committed.
    pub fn replace_calls(&self) -> usize {
        self.replace_calls
    }

    /// Make every operation fail with [`Error::Unavailable`].
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Fail `read_range` for the given sensor.
    pub fn fail_reads_for(&mut self, sensor_id: &str) {
        self.fail_reads.insert(sensor_id.to_string());
    }

    /// Fail `replace_buckets` whenever it touches the given sensor.
    pub fn fail_replace_for(&mut self, sensor_id: &str) {
        self.fail_replaces.insert(sensor_id.to_string());
    }

    /// Clear all injected failures.
    pub fn clear_failures(&mut self) {
        self.unavailable = false;
        self.fail_reads.clear();
        self.fail_replaces.clear();
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            Err(Error::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl ReadingStore for MemoryStore {
    fn list_sensor_ids(&self) -> Result<BTreeSet<String>> {
        self.check_available()?;
        Ok(self.readings.iter().map(|r| r.sensor_id.clone()).collect())
    }

    fn read_range(&self, sensor_id: &str, start: i64, end: i64) -> Result<Vec<StoredReading>> {
        self.check_available()?;
        if self.fail_reads.contains(sensor_id) {
            return Err(Error::Injected(format!("read failure for {}", sensor_id)));
        }

        Ok(self
            .readings_for(sensor_id)
            .into_iter()
            .filter(|r| r.timestamp >= start && r.timestamp < end)
            .collect())
    }

    fn replace_buckets(&mut self, replacements: &[BucketReplacement]) -> Result<()> {
        self.check_available()?;
        if replacements.is_empty() {
            return Ok(());
        }

        // Validate everything up front so a failure leaves the store untouched
        let mut doomed = HashSet::new();
        for replacement in replacements {
            if self.fail_replaces.contains(&replacement.inserted.sensor_id) {
                return Err(Error::Injected(format!(
                    "replace failure for {}",
                    replacement.inserted.sensor_id
                )));
            }
            for id in &replacement.deleted {
                let exists = self.readings.iter().any(|r| r.id == *id);
                if !exists || !doomed.insert(*id) {
                    return Err(Error::MissingReading(*id));
                }
            }
        }

        self.readings.retain(|r| !doomed.contains(&r.id));
        for replacement in replacements {
            self.insert(replacement.inserted.clone());
        }
        self.replace_calls += 1;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_increase() {
        let mut store = MemoryStore::new();
        let a = store.insert(Reading::new("S1", 0));
        let b = store.insert(Reading::new("S1", 0));
        assert!(b > a);
    }

    #[test]
    fn test_default_store_ids_start_at_one() {
        let mut store = MemoryStore::default();
        assert_eq!(store.insert(Reading::new("S1", 0)), 1);
    }

    #[test]
    fn test_read_range_filters_sensor_and_time() {
        let mut store = MemoryStore::new();
        store.extend([
            Reading::new("S1", 300),
            Reading::new("S1", 100),
            Reading::new("S2", 150),
            Reading::new("S1", 500),
        ]);

        let readings = store.read_range("S1", 100, 500).unwrap();
        let timestamps: Vec<i64> = readings.iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![100, 300]);
    }

    #[test]
    fn test_replace_rejects_duplicate_ids() {
        let mut store = MemoryStore::new();
        let id = store.insert(Reading::new("S1", 0));

        let result = store.replace_buckets(&[BucketReplacement {
            deleted: vec![id, id],
            inserted: Reading::new("S1", 0),
        }]);

        assert!(matches!(result, Err(Error::MissingReading(_))));
        assert_eq!(store.len(), 1);
        assert_eq!(store.replace_calls(), 0);
    }

    #[test]
    fn test_injected_replace_failure_leaves_store_untouched() {
        let mut store = MemoryStore::new();
        let a = store.insert(Reading::new("S1", 0));
        let b = store.insert(Reading::new("S2", 0));
        let c = store.insert(Reading::new("S2", 1));
        store.fail_replace_for("S2");

        let result = store.replace_buckets(&[
            BucketReplacement {
                deleted: vec![a],
                inserted: Reading::new("S1", 0),
            },
            BucketReplacement {
                deleted: vec![b, c],
                inserted: Reading::new("S2", 0),
            },
        ]);

        assert!(matches!(result, Err(Error::Injected(_))));
        let ids: Vec<i64> = store.readings().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn test_unavailable_and_clear() {
        let mut store = MemoryStore::new();
        store.insert(Reading::new("S1", 0));
        store.set_unavailable(true);
        assert!(store.list_sensor_ids().unwrap_err().is_unavailable());

        store.clear_failures();
        assert_eq!(store.list_sensor_ids().unwrap().len(), 1);
    }

    #[test]
    fn test_fail_reads_for_sensor() {
        let mut store = MemoryStore::new();
        store.insert(Reading::new("S1", 0));
        store.insert(Reading::new("S2", 0));
        store.fail_reads_for("S1");

        assert!(store.read_range("S1", 0, 10).is_err());
        assert_eq!(store.read_range("S2", 0, 10).unwrap().len(), 1);
    }
}
