//! Sensor enumeration.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use ruuvi_store::ReadingStore;

/// List every sensor that has stored readings.
///
/// Never fails: a store that is not open yet, or that errors while listing,
/// yields an empty set so the caller simply has nothing to do.
pub fn known_sensors<S: ReadingStore>(store: &S) -> BTreeSet<String> {
    match store.list_sensor_ids() {
        Ok(ids) => {
            debug!("Found {} sensor(s)", ids.len());
            ids
        }
        Err(e) if e.is_unavailable() => {
            debug!("Store not available, no sensors to process");
            BTreeSet::new()
        }
        Err(e) => {
            warn!("Failed to list sensors: {}", e);
            BTreeSet::new()
        }
    }
}
