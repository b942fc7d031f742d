//! Data models for stored data.

use serde::{Deserialize, Serialize};

use ruuvi_types::Reading;

/// A reading stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    /// Database row ID.
    pub id: i64,
    /// Sensor identifier.
    pub sensor_id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Temperature in degrees Celsius.
    pub temperature: Option<f64>,
    /// Relative humidity percentage.
    pub humidity: Option<f64>,
    /// Air pressure in hPa.
    pub pressure: Option<f64>,
    /// Battery voltage in volts.
    pub battery: Option<f64>,
}

impl StoredReading {
    /// Create a StoredReading from a Reading and the row ID it was stored under.
    pub fn from_reading(id: i64, reading: &Reading) -> Self {
        Self {
            id,
            sensor_id: reading.sensor_id.clone(),
            timestamp: reading.timestamp,
            temperature: reading.temperature,
            humidity: reading.humidity,
            pressure: reading.pressure,
            battery: reading.battery,
        }
    }

    /// Convert to a Reading, dropping the row ID.
    pub fn to_reading(&self) -> Reading {
        Reading {
            sensor_id: self.sensor_id.clone(),
            timestamp: self.timestamp,
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            battery: self.battery,
        }
    }
}

/// One bucket collapse: delete `deleted` and insert `inserted` in their place.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketReplacement {
    /// Row IDs of the readings being replaced.
    pub deleted: Vec<i64>,
    /// The reading that takes their place.
    pub inserted: Reading,
}

/// Per-sensor summary of what is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorStats {
    /// Sensor identifier.
    pub sensor_id: String,
    /// Number of stored readings.
    pub count: u64,
    /// Timestamp of the oldest reading (ms).
    pub oldest: i64,
    /// Timestamp of the newest reading (ms).
    pub newest: i64,
}
