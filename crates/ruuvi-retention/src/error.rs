//! Error types for ruuvi-retention.

use crate::config::ValidationError;

/// Result type for ruuvi-retention operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running retention.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Processing one sensor in one tier failed and the policy is to abort.
    #[error("Tier '{tier}' failed for sensor {sensor_id}: {source}")]
    Sensor {
        tier: String,
        sensor_id: String,
        #[source]
        source: ruuvi_store::Error,
    },

    /// The tier list does not describe a usable policy.
    #[error("Invalid retention policy:\n{}", crate::config::format_validation_errors(.0))]
    InvalidPolicy(Vec<ValidationError>),
}
