//! Bucket assignment and grouping.

use std::collections::BTreeMap;

use ruuvi_store::StoredReading;

/// Start of the fixed-width interval containing `timestamp`.
///
/// Intervals are aligned to the Unix epoch, so this is
/// `floor(timestamp / width) * width`, including for timestamps before 1970.
///
/// # Panics
///
/// Panics if `width` is zero. Widths come from a validated
/// [`RetentionPolicy`](crate::RetentionPolicy), which rejects non-positive values.
///
/// # Examples
///
/// ```
/// use ruuvi_retention::bucket_start;
/// use ruuvi_types::{HOUR_MS, MINUTE_MS};
///
/// assert_eq!(bucket_start(7 * MINUTE_MS, 5 * MINUTE_MS), 5 * MINUTE_MS);
/// assert_eq!(bucket_start(HOUR_MS - 1, HOUR_MS), 0);
/// assert_eq!(bucket_start(-1, HOUR_MS), -HOUR_MS);
/// ```
#[must_use]
pub fn bucket_start(timestamp: i64, width: i64) -> i64 {
    debug_assert!(width > 0, "bucket width must be positive");
    timestamp.div_euclid(width) * width
}

/// Readings of one sensor that fall in the same bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketGroup {
    /// Start of the bucket (ms).
    pub start: i64,
    /// Member readings in the order they were encountered.
    pub readings: Vec<StoredReading>,
}

impl BucketGroup {
    /// Number of readings in the bucket.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Returns `true` if the bucket has no readings.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Row IDs of the member readings.
    pub fn ids(&self) -> Vec<i64> {
        self.readings.iter().map(|r| r.id).collect()
    }
}

/// Partition readings by bucket, ordered by bucket start.
///
/// Order within each group follows the input order.
pub fn group_by_bucket(readings: Vec<StoredReading>, width: i64) -> Vec<BucketGroup> {
    let mut groups: BTreeMap<i64, Vec<StoredReading>> = BTreeMap::new();
    for reading in readings {
        groups
            .entry(bucket_start(reading.timestamp, width))
            .or_default()
            .push(reading);
    }

    groups
        .into_iter()
        .map(|(start, readings)| BucketGroup { start, readings })
        .collect()
}
