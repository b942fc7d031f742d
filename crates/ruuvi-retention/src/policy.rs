//! Retention tiers and the windows they cover.
//!
//! A [`RetentionPolicy`] is an ordered list of [`Tier`]s, oldest first. Each
//! tier rewrites readings older than its `min_age` into buckets of its
//! `bucket_width`, starting where the previous (older) tier stopped:
//!
//! ```text
//!  epoch 0            now - 7d            now - 24h          now
//!     |---- hourly -------|--- five-minute ---|--- untouched ---|
//! ```
//!
//! Each cutoff is floored to its tier's bucket width, so a window always
//! holds whole buckets and no aggregate lands in a neighbouring tier's range.
//! Every width must divide the width of the tier before it, which keeps the
//! start of the next window on a boundary of its own buckets too.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use ruuvi_types::{DAY_MS, HOUR_MS, MINUTE_MS};

use crate::bucket::bucket_start;
use crate::config::ValidationError;
use crate::error::{Error, Result};

/// Lower bound of the oldest tier.
pub const EPOCH_ZERO: i64 = 0;

/// Width of the buckets used for data between one and seven days old.
pub const FIVE_MINUTES_MS: i64 = 5 * MINUTE_MS;
/// Width of the buckets used for data older than seven days.
pub const ONE_HOUR_MS: i64 = HOUR_MS;

/// What to do when one sensor fails inside a tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log and record the failure, then carry on with the remaining sensors and tiers.
    #[default]
    Continue,
    /// Stop the run and return the first failure.
    Abort,
}

/// One `(age threshold, bucket width)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Name used in logs and reports.
    pub name: String,
    /// Readings at least this old (ms) are eligible.
    pub min_age_ms: i64,
    /// Bucket width (ms).
    pub bucket_width_ms: i64,
}

impl Tier {
    /// Create a tier.
    pub fn new(name: impl Into<String>, min_age_ms: i64, bucket_width_ms: i64) -> Self {
        Self {
            name: name.into(),
            min_age_ms,
            bucket_width_ms,
        }
    }

    /// Data older than seven days collapses into one-hour buckets.
    pub fn hourly() -> Self {
        Self::new("hourly", 7 * DAY_MS, ONE_HOUR_MS)
    }

    /// Data between 24 hours and seven days old collapses into five-minute buckets.
    pub fn five_minute() -> Self {
        Self::new("five-minute", DAY_MS, FIVE_MINUTES_MS)
    }
}

/// The time range a tier covers for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierWindow<'a> {
    /// The tier being applied.
    pub tier: &'a Tier,
    /// Inclusive lower bound (ms).
    pub start: i64,
    /// Exclusive upper bound (ms).
    pub end: i64,
}

/// Ordered retention tiers plus the failure policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    tiers: Vec<Tier>,
    on_error: FailurePolicy,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            tiers: vec![Tier::hourly(), Tier::five_minute()],
            on_error: FailurePolicy::default(),
        }
    }
}

impl RetentionPolicy {
    /// Create a policy from tiers ordered oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPolicy`] listing every problem found.
    pub fn new(tiers: Vec<Tier>, on_error: FailurePolicy) -> Result<Self> {
        let errors = validate_tiers(&tiers);
        if !errors.is_empty() {
            return Err(Error::InvalidPolicy(errors));
        }
        Ok(Self { tiers, on_error })
    }

    /// Replace the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, on_error: FailurePolicy) -> Self {
        self.on_error = on_error;
        self
    }

    /// Tiers in execution order.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// The failure policy.
    pub fn on_error(&self) -> FailurePolicy {
        self.on_error
    }

    /// Compute the window each tier covers at `now`, in execution order.
    ///
    /// A window ends at `now - min_age` rounded down to the tier's bucket
    /// width. Readings between that boundary and the exact cutoff wait for a
    /// later run. A tier whose window would be empty (because `now` is
    /// earlier than its age threshold) is left out.
    pub fn windows(&self, now: i64) -> Vec<TierWindow<'_>> {
        let mut windows = Vec::with_capacity(self.tiers.len());
        let mut start = EPOCH_ZERO;

        for tier in &self.tiers {
            let cutoff = now.saturating_sub(tier.min_age_ms);
            if cutoff <= start {
                continue;
            }

            let end = bucket_start(cutoff, tier.bucket_width_ms);
            if end > start {
                windows.push(TierWindow { tier, start, end });
                start = end;
            }
        }

        windows
    }
}

/// Check a tier list, returning every problem found.
///
/// Besides positive values and unique names, tiers must be ordered oldest
/// first and each bucket width must evenly divide the previous one.
///
/// Field paths are relative (`tiers[1].min_age`) so callers can prefix them.
pub fn validate_tiers(tiers: &[Tier]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if tiers.is_empty() {
        errors.push(ValidationError {
            field: "tiers".to_string(),
            message: "at least one tier is required".to_string(),
        });
    }

    let mut names = HashSet::new();
    for (i, tier) in tiers.iter().enumerate() {
        let prefix = format!("tiers[{}]", i);

        if tier.name.trim().is_empty() {
            errors.push(ValidationError {
                field: format!("{}.name", prefix),
                message: "tier name cannot be empty".to_string(),
            });
        } else if !names.insert(tier.name.as_str()) {
            errors.push(ValidationError {
                field: format!("{}.name", prefix),
                message: format!("duplicate tier name '{}'", tier.name),
            });
        }

        if tier.bucket_width_ms <= 0 {
            errors.push(ValidationError {
                field: format!("{}.bucket_width", prefix),
                message: "bucket width must be positive".to_string(),
            });
        }

        if tier.min_age_ms <= 0 {
            errors.push(ValidationError {
                field: format!("{}.min_age", prefix),
                message: "minimum age must be positive".to_string(),
            });
        }

        if i > 0
            && tier.bucket_width_ms > 0
            && tiers[i - 1].bucket_width_ms > 0
            && tiers[i - 1].bucket_width_ms % tier.bucket_width_ms != 0
        {
            errors.push(ValidationError {
                field: format!("{}.bucket_width", prefix),
                message: format!(
                    "bucket width {}ms must evenly divide {}ms of '{}'",
                    tier.bucket_width_ms,
                    tiers[i - 1].bucket_width_ms,
                    tiers[i - 1].name
                ),
            });
        }

        if i > 0 && tier.min_age_ms >= tiers[i - 1].min_age_ms {
            errors.push(ValidationError {
                field: format!("{}.min_age", prefix),
                message: format!(
                    "tiers must be ordered oldest first: min age {}ms is not below {}ms of '{}'",
                    tier.min_age_ms,
                    tiers[i - 1].min_age_ms,
                    tiers[i - 1].name
                ),
            });
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 100 * DAY_MS;

    #[test]
    fn test_default_policy_tiers() {
        let policy = RetentionPolicy::default();
        let tiers = policy.tiers();

        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[0].name, "hourly");
        assert_eq!(tiers[0].min_age_ms, 604_800_000);
        assert_eq!(tiers[0].bucket_width_ms, 3_600_000);
        assert_eq!(tiers[1].name, "five-minute");
        assert_eq!(tiers[1].min_age_ms, 86_400_000);
        assert_eq!(tiers[1].bucket_width_ms, 300_000);
        assert_eq!(policy.on_error(), FailurePolicy::Continue);
    }

    #[test]
    fn test_default_windows() {
        let policy = RetentionPolicy::default();
        let windows = policy.windows(NOW);

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].tier.name, "hourly");
        assert_eq!((windows[0].start, windows[0].end), (0, NOW - 7 * DAY_MS));
        assert_eq!(windows[1].tier.name, "five-minute");
        assert_eq!(
            (windows[1].start, windows[1].end),
            (NOW - 7 * DAY_MS, NOW - DAY_MS)
        );
    }

    #[test]
    fn test_windows_floor_to_bucket_width() {
        let policy = RetentionPolicy::default();
        let now = NOW + 2 * HOUR_MS + 7 * MINUTE_MS + 31_000;
        let windows = policy.windows(now);

        // now - 7d floored to the hour, now - 24h floored to five minutes
        assert_eq!(windows[0].end, NOW - 7 * DAY_MS + 2 * HOUR_MS);
        assert_eq!(windows[1].start, windows[0].end);
        assert_eq!(windows[1].end, NOW - DAY_MS + 2 * HOUR_MS + 5 * MINUTE_MS);

        for window in &windows {
            assert_eq!(window.start % window.tier.bucket_width_ms, 0);
            assert_eq!(window.end % window.tier.bucket_width_ms, 0);
        }
    }

    #[test]
    fn test_windows_skip_tier_below_its_first_bucket() {
        let policy = RetentionPolicy::default();

        // Seven days and ten minutes: the hourly cutoff is inside the first hour
        let windows = policy.windows(7 * DAY_MS + 10 * MINUTE_MS);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].tier.name, "five-minute");
        assert_eq!((windows[0].start, windows[0].end), (0, 6 * DAY_MS + 10 * MINUTE_MS));
    }

    #[test]
    fn test_validate_rejects_widths_that_do_not_nest() {
        let errors = validate_tiers(&[
            Tier::new("hourly", 7 * DAY_MS, HOUR_MS),
            Tier::new("seven-minute", DAY_MS, 7 * MINUTE_MS),
        ]);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "tiers[1].bucket_width");
        assert!(errors[0].message.contains("evenly divide"));
    }

    #[test]
    fn test_windows_are_contiguous_and_exclude_recent_data() {
        let policy = RetentionPolicy::default();
        let windows = policy.windows(NOW);

        assert_eq!(windows[0].end, windows[1].start);
        assert!(windows.iter().all(|w| w.end <= NOW - DAY_MS));
    }

    #[test]
    fn test_windows_skip_tiers_not_yet_reached() {
        let policy = RetentionPolicy::default();

        // Three days after the epoch only the five-minute tier has anything to do
        let windows = policy.windows(3 * DAY_MS);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].tier.name, "five-minute");
        assert_eq!((windows[0].start, windows[0].end), (0, 2 * DAY_MS));

        assert!(policy.windows(DAY_MS).is_empty());
        assert!(policy.windows(0).is_empty());
    }

    #[test]
    fn test_new_accepts_valid_tiers() {
        let policy = RetentionPolicy::new(
            vec![
                Tier::new("daily", 90 * DAY_MS, DAY_MS),
                Tier::hourly(),
                Tier::five_minute(),
            ],
            FailurePolicy::Abort,
        )
        .unwrap();

        assert_eq!(policy.tiers().len(), 3);
        assert_eq!(policy.on_error(), FailurePolicy::Abort);
        assert_eq!(policy.windows(NOW).len(), 3);
    }

    #[test]
    fn test_new_rejects_empty() {
        let err = RetentionPolicy::new(Vec::new(), FailurePolicy::Continue).unwrap_err();
        assert!(err.to_string().contains("at least one tier"));
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let errors = validate_tiers(&[
            Tier::new("a", DAY_MS, 0),
            Tier::new("a", 7 * DAY_MS, HOUR_MS),
            Tier::new("", -1, HOUR_MS),
        ]);

        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"tiers[0].bucket_width"));
        assert!(fields.contains(&"tiers[1].name"));
        assert!(fields.contains(&"tiers[1].min_age"));
        assert!(fields.contains(&"tiers[2].name"));
        assert!(fields.contains(&"tiers[2].min_age"));
    }

    #[test]
    fn test_failure_policy_serde() {
        #[derive(Deserialize)]
        struct Wrapper {
            on_error: FailurePolicy,
        }

        let w: Wrapper = toml::from_str(r#"on_error = "abort""#).unwrap();
        assert_eq!(w.on_error, FailurePolicy::Abort);
        assert!(toml::from_str::<Wrapper>(r#"on_error = "retry""#).is_err());
    }
}
