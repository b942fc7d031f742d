//! Core types for Ruuvi sensor data.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::timestamp::format_millis;

/// A single timestamped observation from one sensor.
///
/// Every metric is optional: a tag may omit a field (older data formats do
/// not report pressure, for example) and an aggregate built from a bucket
/// with no values for a metric carries `None` rather than a placeholder.
///
/// `timestamp` is milliseconds since the Unix epoch and is the key readings
/// are ordered and bucketed by.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    /// Sensor identifier (usually the tag's MAC address).
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

impl Reading {
    /// Create a reading with no metric values.
    pub fn new(sensor_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            timestamp,
            temperature: None,
            humidity: None,
            pressure: None,
            battery: None,
        }
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, value: f64) -> Self {
        self.temperature = Some(value);
        self
    }

    /// Set the humidity.
    #[must_use]
    pub fn with_humidity(mut self, value: f64) -> Self {
        self.humidity = Some(value);
        self
    }

    /// Set the pressure.
    #[must_use]
    pub fn with_pressure(mut self, value: f64) -> Self {
        self.pressure = Some(value);
        self
    }

    /// Set the battery voltage.
    #[must_use]
    pub fn with_battery(mut self, value: f64) -> Self {
        self.battery = Some(value);
        self
    }

    /// Returns `true` if none of the metrics carry a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.humidity.is_none()
            && self.pressure.is_none()
            && self.battery.is_none()
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.sensor_id, format_millis(self.timestamp))?;
        if let Some(t) = self.temperature {
            write!(f, " {:.2}°C", t)?;
        }
        if let Some(h) = self.humidity {
            write!(f, " {:.1}%", h)?;
        }
        if let Some(p) = self.pressure {
            write!(f, " {:.1}hPa", p)?;
        }
        if let Some(b) = self.battery {
            write!(f, " {:.3}V", b)?;
        }
        Ok(())
    }
}
