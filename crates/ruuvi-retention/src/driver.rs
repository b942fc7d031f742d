//! Retention policy driver.
//!
//! [`Retention`] applies every tier of a [`RetentionPolicy`] to every known
//! sensor. It has no timer of its own: the caller decides when to run and
//! passes the current time in, which keeps runs deterministic.
//!
//! Atomicity is per sensor per tier. A failure for one sensor never rolls
//! back work already committed for another.

use tracing::{error, info};

use ruuvi_store::ReadingStore;
use ruuvi_types::timestamp::format_millis;

use crate::error::{Error, Result};
use crate::policy::{FailurePolicy, RetentionPolicy};
use crate::report::{RunReport, SensorFailure, TierReport};
use crate::rewriter::{Mode, Rewriter};
use crate::sensors::known_sensors;

/// Runs a retention policy against a store.
///
/// # Example
///
/// ```
/// use ruuvi_retention::{Retention, RetentionPolicy};
/// use ruuvi_store::MemoryStore;
/// use ruuvi_types::{DAY_MS, MINUTE_MS, Reading};
///
/// let mut store = MemoryStore::new();
/// for i in 0..5 {
///     store.insert(Reading::new("S1", 10 * DAY_MS + i * MINUTE_MS).with_temperature(20.0));
/// }
///
/// let mut retention = Retention::new(&mut store, RetentionPolicy::default());
/// let report = retention.run(12 * DAY_MS)?;
///
/// assert!(report.is_success());
/// assert_eq!(store.len(), 1);
/// # Ok::<(), ruuvi_retention::Error>(())
/// ```
pub struct Retention<S> {
    store: S,
    policy: RetentionPolicy,
}

impl<S: ReadingStore> Retention<S> {
    /// Create a driver over `store`.
    pub fn new(store: S, policy: RetentionPolicy) -> Self {
        Self { store, policy }
    }

    /// Apply every tier at `now` (milliseconds since the Unix epoch).
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Abort`] the first per-sensor failure is returned
    /// as [`Error::Sensor`]. Under [`FailurePolicy::Continue`] failures are
    /// recorded in the report instead and this only returns `Ok`.
    pub fn run(&mut self, now: i64) -> Result<RunReport> {
        self.execute(now, Mode::Apply)
    }

    /// Compute what [`run`](Retention::run) would do at `now` without writing.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Retention::run).
    pub fn plan(&mut self, now: i64) -> Result<RunReport> {
        self.execute(now, Mode::Plan)
    }

    fn execute(&mut self, now: i64, mode: Mode) -> Result<RunReport> {
        let mut report = RunReport::new(now, mode);
        let on_error = self.policy.on_error();

        // Tiers run oldest first; each one finishes for all sensors before the next starts
        for window in self.policy.windows(now) {
            info!(
                "Applying tier '{}' to [{}, {}) with {}ms buckets",
                window.tier.name,
                format_millis(window.start),
                format_millis(window.end),
                window.tier.bucket_width_ms
            );

            let sensors = known_sensors(&self.store);
            let mut tier_report = TierReport {
                tier: window.tier.name.clone(),
                bucket_width_ms: window.tier.bucket_width_ms,
                start: window.start,
                end: window.end,
                sensors: sensors.len(),
                outcome: Default::default(),
            };

            let mut rewriter = Rewriter::new(&mut self.store, mode);
            for sensor_id in &sensors {
                match rewriter.rewrite(
                    sensor_id,
                    window.start,
                    window.end,
                    window.tier.bucket_width_ms,
                ) {
                    Ok(outcome) => tier_report.outcome.absorb(outcome),
                    Err(e) => match on_error {
                        FailurePolicy::Abort => {
                            error!(
                                "Tier '{}' failed for {}, aborting run: {}",
                                window.tier.name, sensor_id, e
                            );
                            return Err(Error::Sensor {
                                tier: window.tier.name.clone(),
                                sensor_id: sensor_id.clone(),
                                source: e,
                            });
                        }
                        FailurePolicy::Continue => {
                            error!(
                                "Tier '{}' failed for {}, continuing: {}",
                                window.tier.name, sensor_id, e
                            );
                            report.failures.push(SensorFailure {
                                tier: window.tier.name.clone(),
                                sensor_id: sensor_id.clone(),
                                error: e.to_string(),
                            });
                        }
                    },
                }
            }

            info!(
                "Tier '{}': {} sensor(s), {} bucket(s) collapsed, {} reading(s) removed",
                tier_report.tier,
                tier_report.sensors,
                tier_report.outcome.buckets_collapsed,
                tier_report.outcome.readings_removed()
            );
            report.tiers.push(tier_report);
        }

        info!(
            "Retention {} at {}: {} reading(s) removed, {} failure(s)",
            if mode == Mode::Apply { "run" } else { "plan" },
            format_millis(now),
            report.totals().readings_removed(),
            report.failures.len()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Tier;
    use ruuvi_store::MemoryStore;
    use ruuvi_types::{DAY_MS, HOUR_MS, MINUTE_MS, Reading};

    const NOW: i64 = 30 * DAY_MS;

    fn seed_minutes(store: &mut MemoryStore, sensor: &str, start: i64, count: i64) {
        for i in 0..count {
            store.insert(
                Reading::new(sensor, start + i * MINUTE_MS)
                    .with_temperature(20.0 + i as f64)
                    .with_battery(3.0 - i as f64 * 0.01),
            );
        }
    }

    #[test]
    fn test_run_empty_store() {
        let mut store = MemoryStore::new();
        let report = Retention::new(&mut store, RetentionPolicy::default())
            .run(NOW)
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.tiers.len(), 2);
        assert!(report.tiers.iter().all(|t| t.sensors == 0));
        assert!(store.is_empty());
    }

    #[test]
    fn test_run_unavailable_store_is_noop() {
        let none: Option<MemoryStore> = None;
        let mut retention = Retention::new(none, RetentionPolicy::default());

        let report = retention.run(NOW).unwrap();
        assert!(report.is_success());
        assert_eq!(report.totals().readings_scanned, 0);
    }

    #[test]
    fn test_tiers_apply_their_widths() {
        let mut store = MemoryStore::new();
        // Two hours of minute data, ten days old
        let old = NOW - 10 * DAY_MS;
        seed_minutes(&mut store, "S1", old, 120);
        // Twenty minutes of minute data, two days old
        let mid = NOW - 2 * DAY_MS;
        seed_minutes(&mut store, "S1", mid, 20);
        // Recent data is untouched
        seed_minutes(&mut store, "S1", NOW - HOUR_MS, 30);

        let report = Retention::new(&mut store, RetentionPolicy::default())
            .run(NOW)
            .unwrap();

        assert_eq!(report.tiers[0].outcome.buckets_collapsed, 2);
        assert_eq!(report.tiers[1].outcome.buckets_collapsed, 4);

        let readings = store.readings_for("S1");
        let old_count = readings.iter().filter(|r| r.timestamp < mid).count();
        let mid_count = readings
            .iter()
            .filter(|r| r.timestamp >= mid && r.timestamp < NOW - DAY_MS)
            .count();
        let recent_count = readings.iter().filter(|r| r.timestamp >= NOW - DAY_MS).count();
        assert_eq!(old_count, 2);
        assert_eq!(mid_count, 4);
        assert_eq!(recent_count, 30);
    }

    #[test]
    fn test_unaligned_now_is_idempotent() {
        let now = NOW + 2 * MINUTE_MS;
        let week = now - 7 * DAY_MS;
        let mut store = MemoryStore::new();
        for i in -90..90 {
            store.insert(Reading::new("S1", week + i * MINUTE_MS).with_temperature(i as f64));
        }

        let first = Retention::new(&mut store, RetentionPolicy::default())
            .run(now)
            .unwrap();
        assert!(first.totals().buckets_collapsed > 0);
        let after_first = store.readings();

        let second = Retention::new(&mut store, RetentionPolicy::default())
            .run(now)
            .unwrap();
        assert_eq!(second.totals().buckets_collapsed, 0);
        assert_eq!(store.readings(), after_first);

        // No two readings share a timestamp across the tier boundary
        let timestamps: Vec<i64> = after_first.iter().map(|r| r.timestamp).collect();
        let mut distinct = timestamps.clone();
        distinct.dedup();
        assert_eq!(distinct, timestamps);
    }

    #[test]
    fn test_continue_policy_isolates_failures() {
        let mut store = MemoryStore::new();
        let old = NOW - 10 * DAY_MS;
        seed_minutes(&mut store, "A", old, 10);
        seed_minutes(&mut store, "B", old, 10);
        seed_minutes(&mut store, "C", old, 10);
        store.fail_replace_for("B");
        let b_before = store.readings_for("B");

        let report = Retention::new(&mut store, RetentionPolicy::default())
            .run(NOW)
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].sensor_id, "B");
        assert_eq!(report.failures[0].tier, "hourly");
        assert_eq!(store.readings_for("A").len(), 1);
        assert_eq!(store.readings_for("B"), b_before);
        assert_eq!(store.readings_for("C").len(), 1);
    }

    #[test]
    fn test_abort_policy_stops_at_first_failure() {
        let mut store = MemoryStore::new();
        let old = NOW - 10 * DAY_MS;
        seed_minutes(&mut store, "A", old, 10);
        seed_minutes(&mut store, "B", old, 10);
        seed_minutes(&mut store, "C", old, 10);
        store.fail_reads_for("B");

        let policy = RetentionPolicy::default().with_failure_policy(FailurePolicy::Abort);
        let err = Retention::new(&mut store, policy).run(NOW).unwrap_err();

        match err {
            Error::Sensor {
                tier, sensor_id, ..
            } => {
                assert_eq!(tier, "hourly");
                assert_eq!(sensor_id, "B");
            }
            other => panic!("unexpected error: {other}"),
        }

        // A was committed before the failure, C was never reached
        assert_eq!(store.readings_for("A").len(), 1);
        assert_eq!(store.readings_for("C").len(), 10);
    }

    #[test]
    fn test_plan_reports_without_writing() {
        let mut store = MemoryStore::new();
        seed_minutes(&mut store, "S1", NOW - 10 * DAY_MS, 60);
        let before = store.readings();

        let report = Retention::new(&mut store, RetentionPolicy::default())
            .plan(NOW)
            .unwrap();

        assert_eq!(report.mode, Mode::Plan);
        assert_eq!(report.totals().readings_removed(), 59);
        assert_eq!(store.readings(), before);
    }

    #[test]
    fn test_custom_single_tier() {
        let mut store = MemoryStore::new();
        seed_minutes(&mut store, "S1", NOW - 3 * HOUR_MS, 60);

        let policy = RetentionPolicy::new(
            vec![Tier::new("quarter-hour", 2 * HOUR_MS, 15 * MINUTE_MS)],
            FailurePolicy::Continue,
        )
        .unwrap();
        let report = Retention::new(&mut store, policy).run(NOW).unwrap();

        assert_eq!(report.tiers.len(), 1);
        assert_eq!(report.tiers[0].outcome.buckets_collapsed, 4);
        assert_eq!(store.len(), 4);
    }
}
