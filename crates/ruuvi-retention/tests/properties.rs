//! Property tests for aggregation and whole retention runs.

use std::collections::BTreeMap;

use proptest::prelude::*;

use ruuvi_retention::{
    FIVE_MINUTES_MS, ONE_HOUR_MS, Retention, RetentionPolicy, RunReport, aggregate, bucket_start,
};
use ruuvi_store::{MemoryStore, StoredReading};
use ruuvi_types::{DAY_MS, MINUTE_MS, Reading};

const NOW: i64 = 20_000 * DAY_MS;

fn metric() -> impl Strategy<Value = Option<f64>> {
    prop::option::weighted(0.8, -40.0f64..60.0)
}

fn stored(id: i64, temperature: Option<f64>, battery: Option<f64>) -> StoredReading {
    StoredReading {
        id,
        sensor_id: "S1".to_string(),
        timestamp: id * MINUTE_MS,
        temperature,
        humidity: None,
        pressure: None,
        battery,
    }
}

/// A `now` up to an hour past a day boundary, and readings for a few sensors
/// spread over the ten days before it, clustered around the tier cutoffs.
fn scenario() -> impl Strategy<Value = (i64, Vec<Reading>)> {
    let age = prop_oneof![
        0i64..10 * DAY_MS,
        7 * DAY_MS - 2 * ONE_HOUR_MS..7 * DAY_MS + 2 * ONE_HOUR_MS,
        DAY_MS - 30 * MINUTE_MS..DAY_MS + 30 * MINUTE_MS,
    ];
    let readings = prop::collection::vec(
        (
            prop::sample::select(vec!["S1", "S2", "S3"]),
            age,
            metric(),
            prop::option::of(2.0f64..3.3),
        ),
        0..200,
    );

    (0i64..ONE_HOUR_MS, readings).prop_map(|(offset, items)| {
        let now = NOW + offset;
        let readings = items
            .into_iter()
            .map(|(sensor, age, temperature, battery)| Reading {
                sensor_id: sensor.to_string(),
                timestamp: now - age,
                temperature,
                humidity: None,
                pressure: None,
                battery,
            })
            .collect();
        (now, readings)
    })
}

fn seeded(readings: &[Reading]) -> MemoryStore {
    let mut store = MemoryStore::new();
    store.extend(readings.iter().cloned());
    store
}

fn run(store: &mut MemoryStore, now: i64) -> RunReport {
    Retention::new(store, RetentionPolicy::default())
        .run(now)
        .unwrap()
}

/// Bucket width of the tier that owns `timestamp` at `now`, if any.
fn tier_width(now: i64, timestamp: i64) -> Option<i64> {
    if timestamp < bucket_start(now - 7 * DAY_MS, ONE_HOUR_MS) {
        Some(ONE_HOUR_MS)
    } else if timestamp < bucket_start(now - DAY_MS, FIVE_MINUTES_MS) {
        Some(FIVE_MINUTES_MS)
    } else {
        None
    }
}

proptest! {
    #[test]
    fn prop_mean_matches_present_values(values in prop::collection::vec(metric(), 1..30)) {
        let readings: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| stored(i as i64, *v, None))
            .collect();
        let agg = aggregate("S1", 0, &readings);

        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            prop_assert_eq!(agg.temperature, None);
        } else {
            let expected = present.iter().sum::<f64>() / present.len() as f64;
            let actual = agg.temperature.unwrap();
            prop_assert!((actual - expected).abs() < 1e-9);
        }
        prop_assert_eq!(agg.timestamp, 0);
        prop_assert_eq!(agg.sensor_id.as_str(), "S1");
    }

    #[test]
    fn prop_battery_is_minimum(
        values in prop::collection::vec(prop::option::of(2.0f64..3.3), 1..30)
    ) {
        let readings: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| stored(i as i64, None, *v))
            .collect();
        let agg = aggregate("S1", 0, &readings);

        let expected = values.iter().flatten().copied().reduce(f64::min);
        prop_assert_eq!(agg.battery, expected);
    }

    #[test]
    fn prop_run_is_idempotent((now, readings) in scenario()) {
        let mut store = seeded(&readings);

        run(&mut store, now);
        let after_first = store.readings();

        let report = run(&mut store, now);
        prop_assert_eq!(report.totals().buckets_collapsed, 0);
        prop_assert_eq!(store.readings(), after_first);
    }

    #[test]
    fn prop_run_never_adds_rows((now, readings) in scenario()) {
        let mut store = seeded(&readings);
        let before = store.len();

        let report = run(&mut store, now);

        prop_assert!(store.len() <= before);
        prop_assert_eq!(before - store.len(), report.totals().readings_removed());
    }

    #[test]
    fn prop_one_reading_per_bucket_after_run((now, readings) in scenario()) {
        let mut store = seeded(&readings);
        run(&mut store, now);

        let mut buckets: BTreeMap<(String, i64), usize> = BTreeMap::new();
        for reading in store.readings() {
            if let Some(width) = tier_width(now, reading.timestamp) {
                let start = bucket_start(reading.timestamp, width);
                *buckets.entry((reading.sensor_id.clone(), start)).or_default() += 1;
            }
        }
        prop_assert!(buckets.values().all(|&n| n == 1));
    }

    #[test]
    fn prop_recent_readings_untouched((now, readings) in scenario()) {
        let mut store = seeded(&readings);
        let recent = |s: &MemoryStore| -> Vec<StoredReading> {
            s.readings()
                .into_iter()
                .filter(|r| r.timestamp >= now - DAY_MS)
                .collect()
        };
        let before = recent(&store);

        run(&mut store, now);

        prop_assert_eq!(recent(&store), before);
    }

    #[test]
    fn prop_sensors_do_not_mix((now, readings) in scenario()) {
        let mut together = seeded(&readings);
        run(&mut together, now);

        let strip = |rs: Vec<StoredReading>| -> Vec<Reading> {
            rs.iter().map(StoredReading::to_reading).collect()
        };
        for sensor in ["S1", "S2", "S3"] {
            let own: Vec<Reading> = readings
                .iter()
                .filter(|r| r.sensor_id == sensor)
                .cloned()
                .collect();
            let mut alone = seeded(&own);
            run(&mut alone, now);

            prop_assert_eq!(
                strip(together.readings_for(sensor)),
                strip(alone.readings_for(sensor))
            );
        }
    }
}
