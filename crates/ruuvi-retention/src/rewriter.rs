//! Collapsing one sensor's readings into bucket aggregates.

use serde::{Deserialize, Serialize};
use tracing::debug;

use ruuvi_store::{BucketReplacement, ReadingStore, StoredReading};
use ruuvi_types::timestamp::format_millis;

use crate::aggregate::aggregate;
use crate::bucket::{bucket_start, group_by_bucket};

/// Whether a rewrite changes the store or only reports what it would do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Write the aggregates.
    #[default]
    Apply,
    /// Compute the aggregates and report them without writing.
    Plan,
}

/// What a single rewrite did (or, in [`Mode::Plan`], would do).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteOutcome {
    /// Readings found in the range.
    pub readings_scanned: usize,
    /// Buckets with two or more readings that were collapsed.
    pub buckets_collapsed: usize,
    /// Original readings removed.
    pub readings_deleted: usize,
    /// Aggregate readings inserted.
    pub aggregates_inserted: usize,
}

impl RewriteOutcome {
    /// Net reduction in stored readings.
    pub fn readings_removed(&self) -> usize {
        self.readings_deleted - self.aggregates_inserted
    }

    /// Add another outcome's counts to this one.
    pub fn absorb(&mut self, other: RewriteOutcome) {
        self.readings_scanned += other.readings_scanned;
        self.buckets_collapsed += other.buckets_collapsed;
        self.readings_deleted += other.readings_deleted;
        self.aggregates_inserted += other.aggregates_inserted;
    }
}

/// Build the replacements for every bucket that holds more than one reading.
///
/// Singleton buckets are skipped: they are either an earlier aggregate or a
/// naturally sparse point, and leaving them alone is what makes repeated
/// passes idempotent.
pub fn plan_replacements(
    sensor_id: &str,
    readings: Vec<StoredReading>,
    bucket_width: i64,
) -> Vec<BucketReplacement> {
    group_by_bucket(readings, bucket_width)
        .into_iter()
        .filter(|group| group.len() >= 2)
        .map(|group| BucketReplacement {
            deleted: group.ids(),
            inserted: aggregate(sensor_id, group.start, &group.readings),
        })
        .collect()
}

/// Rewrites time ranges of a single store.
///
/// Every call to [`rewrite`](Rewriter::rewrite) commits at most one
/// transaction, so a failure leaves that call's range exactly as it was.
pub struct Rewriter<'s, S> {
    store: &'s mut S,
    mode: Mode,
}

impl<'s, S: ReadingStore> Rewriter<'s, S> {
    /// Create a rewriter over `store`.
    pub fn new(store: &'s mut S, mode: Mode) -> Self {
        Self { store, mode }
    }

    /// Collapse every multi-reading bucket of `sensor_id` in `[start, end)`.
    ///
    /// Only buckets lying wholly inside the range are considered; a partial
    /// bucket at either edge is left for whichever range contains it. A
    /// store that is not open yet is treated as having nothing to do.
    ///
    /// # Errors
    ///
    /// Returns the store error if the scan or the replacement fails. On a
    /// failed replacement nothing in the range has changed.
    pub fn rewrite(
        &mut self,
        sensor_id: &str,
        start: i64,
        end: i64,
        bucket_width: i64,
    ) -> ruuvi_store::Result<RewriteOutcome> {
        if start >= end {
            return Ok(RewriteOutcome::default());
        }

        let first = bucket_start(start, bucket_width);
        let start = if first < start {
            first.saturating_add(bucket_width)
        } else {
            first
        };
        let end = bucket_start(end, bucket_width);
        if start >= end {
            return Ok(RewriteOutcome::default());
        }

        let readings = match self.store.read_range(sensor_id, start, end) {
            Ok(readings) => readings,
            Err(e) if e.is_unavailable() => {
                debug!("Store not available, skipping {}", sensor_id);
                return Ok(RewriteOutcome::default());
            }
            Err(e) => return Err(e),
        };

        if readings.is_empty() {
            return Ok(RewriteOutcome::default());
        }

        let readings_scanned = readings.len();
        let replacements = plan_replacements(sensor_id, readings, bucket_width);

        let outcome = RewriteOutcome {
            readings_scanned,
            buckets_collapsed: replacements.len(),
            readings_deleted: replacements.iter().map(|r| r.deleted.len()).sum(),
            aggregates_inserted: replacements.len(),
        };

        if replacements.is_empty() {
            debug!(
                "{}: {} reading(s) in [{}, {}), nothing to collapse",
                sensor_id,
                readings_scanned,
                format_millis(start),
                format_millis(end)
            );
            return Ok(outcome);
        }

        if self.mode == Mode::Apply {
            self.store.replace_buckets(&replacements)?;
        }

        debug!(
            "{}: {} {} bucket(s), {} -> {} reading(s) in [{}, {})",
            sensor_id,
            if self.mode == Mode::Apply { "collapsed" } else { "would collapse" },
            outcome.buckets_collapsed,
            outcome.readings_deleted,
            outcome.aggregates_inserted,
            format_millis(start),
            format_millis(end)
        );

        Ok(outcome)
    }
}
