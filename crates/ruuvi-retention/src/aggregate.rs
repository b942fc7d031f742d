//! Null-aware reduction of a bucket into one reading.
//!
//! Temperature, humidity and pressure are averaged over the values that are
//! present. Battery keeps the lowest value present. A metric with no values
//! in the bucket stays `None`. NaN is treated as a missing value.

use ruuvi_store::StoredReading;
use ruuvi_types::Reading;

#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| !v.is_nan()) {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Minimum(Option<f64>);

impl Minimum {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| !v.is_nan()) {
            self.0 = Some(self.0.map_or(v, |current| current.min(v)));
        }
    }

    fn value(self) -> Option<f64> {
        self.0
    }
}

/// Reduce readings that share a bucket into one reading stamped at `bucket_start`.
///
/// `readings` is expected to be non-empty; an empty slice yields a reading
/// with every metric `None`.
///
/// # Examples
///
/// ```
/// use ruuvi_retention::aggregate;
/// use ruuvi_store::StoredReading;
///
/// let readings: Vec<StoredReading> = [(1, Some(20.0), Some(3.0)), (2, None, Some(2.5))]
///     .into_iter()
///     .map(|(id, temperature, battery)| StoredReading {
///         id,
///         sensor_id: "S1".into(),
///         timestamp: id * 60_000,
///         temperature,
///         humidity: None,
///         pressure: None,
///         battery,
///     })
///     .collect();
///
/// let agg = aggregate("S1", 0, &readings);
/// assert_eq!(agg.temperature, Some(20.0));
/// assert_eq!(agg.humidity, None);
/// assert_eq!(agg.battery, Some(2.5));
/// ```
pub fn aggregate(sensor_id: &str, bucket_start: i64, readings: &[StoredReading]) -> Reading {
    let mut temperature = Mean::default();
    let mut humidity = Mean::default();
    let mut pressure = Mean::default();
    let mut battery = Minimum::default();

    for reading in readings {
        temperature.push(reading.temperature);
        humidity.push(reading.humidity);
        pressure.push(reading.pressure);
        battery.push(reading.battery);
    }

    Reading {
        sensor_id: sensor_id.to_string(),
        timestamp: bucket_start,
        temperature: temperature.value(),
        humidity: humidity.value(),
        pressure: pressure.value(),
        battery: battery.value(),
    }
}
