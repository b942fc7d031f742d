//! Summary of a retention run.

use std::fmt;

use serde::{Deserialize, Serialize};

use ruuvi_types::timestamp::format_millis;

use crate::rewriter::{Mode, RewriteOutcome};

/// Totals for one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierReport {
    /// Tier name.
    pub tier: String,
    /// Bucket width (ms).
    pub bucket_width_ms: i64,
    /// Inclusive window start (ms).
    pub start: i64,
    /// Exclusive window end (ms).
    pub end: i64,
    /// Sensors the tier was applied to.
    pub sensors: usize,
    /// Combined rewrite counts for all sensors that succeeded.
    #[serde(flatten)]
    pub outcome: RewriteOutcome,
}

/// A sensor that could not be processed in some tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorFailure {
    /// Tier name.
    pub tier: String,
    /// Sensor identifier.
    pub sensor_id: String,
    /// Error message.
    pub error: String,
}

/// Everything a run did, tier by tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// The `now` the run was computed against (ms).
    pub now: i64,
    /// Whether the run wrote anything.
    pub mode: Mode,
    /// One entry per tier window that was processed.
    pub tiers: Vec<TierReport>,
    /// Sensors that failed (only populated under the continue policy).
    pub failures: Vec<SensorFailure>,
}

impl RunReport {
    /// Create an empty report.
    pub fn new(now: i64, mode: Mode) -> Self {
        Self {
            now,
            mode,
            tiers: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Returns `true` if no sensor failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Counts summed over all tiers.
    pub fn totals(&self) -> RewriteOutcome {
        let mut total = RewriteOutcome::default();
        for tier in &self.tiers {
            total.absorb(tier.outcome);
        }
        total
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.mode {
            Mode::Apply => "Collapsed",
            Mode::Plan => "Would collapse",
        };

        writeln!(f, "Retention run at {}", format_millis(self.now))?;
        if self.tiers.is_empty() {
            writeln!(f, "  No tier windows to process")?;
        }
        for tier in &self.tiers {
            writeln!(
                f,
                "  {} [{} .. {}) {} sensor(s), {} reading(s) scanned, {} {} bucket(s): {} -> {}",
                tier.tier,
                format_millis(tier.start),
                format_millis(tier.end),
                tier.sensors,
                tier.outcome.readings_scanned,
                verb,
                tier.outcome.buckets_collapsed,
                tier.outcome.readings_deleted,
                tier.outcome.aggregates_inserted,
            )?;
        }

        let totals = self.totals();
        writeln!(
            f,
            "  Total: {} reading(s) removed",
            totals.readings_removed()
        )?;

        for failure in &self.failures {
            writeln!(
                f,
                "  FAILED {} / {}: {}",
                failure.tier, failure.sensor_id, failure.error
            )?;
        }

        Ok(())
    }
}
