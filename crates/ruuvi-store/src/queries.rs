//! Query builder for stored readings.
//!
//! [`ReadingQuery`] follows the builder pattern for filtering and ordering
//! stored sensor data. Time bounds are half-open: `since` is inclusive and
//! `before` is exclusive, which matches how retention windows are cut.
//!
//! # Example
//!
//! ```
//! use ruuvi_store::{Store, ReadingQuery};
//! use ruuvi_types::HOUR_MS;
//!
//! let store = Store::open_in_memory()?;
//!
//! // The first hour of data for a sensor, in chronological order
//! let query = ReadingQuery::new()
//!     .sensor("C4:D9:12:AA:01:02")
//!     .between(0, HOUR_MS)
//!     .oldest_first();
//!
//! let readings = store.query_readings(&query)?;
//! # assert!(readings.is_empty());
//! # Ok::<(), ruuvi_store::Error>(())
//! ```

/// Fluent query builder for stored readings.
///
/// Use this to construct queries for [`Store::query_readings`](crate::Store::query_readings).
/// All filter methods are optional and can be chained in any order.
///
/// By default, queries return results ordered by `timestamp` descending
/// (newest first). Ties are broken by row ID in the same direction.
#[derive(Debug, Default, Clone)]
pub struct ReadingQuery {
    /// Filter by sensor ID.
    pub sensor_id: Option<String>,
    /// Only readings at or after this timestamp (ms).
    pub since: Option<i64>,
    /// Only readings strictly before this timestamp (ms).
    pub before: Option<i64>,
    /// Order by timestamp descending (newest first).
    pub newest_first: bool,
}

impl ReadingQuery {
    /// Create a new query with default settings.
    ///
    /// Default behavior:
    /// - No sensor filter (all sensors)
    /// - No time range filter
    /// - Ordered by newest first
    pub fn new() -> Self {
        Self {
            newest_first: true,
            ..Default::default()
        }
    }

    /// Only include readings from the specified sensor.
    pub fn sensor(mut self, sensor_id: &str) -> Self {
        self.sensor_id = Some(sensor_id.to_string());
        self
    }

    /// Filter to readings with `timestamp >= millis`.
    pub fn since(mut self, millis: i64) -> Self {
        self.since = Some(millis);
        self
    }

    /// Filter to readings with `timestamp < millis`.
    pub fn before(mut self, millis: i64) -> Self {
        self.before = Some(millis);
        self
    }

    /// Filter to the half-open range `[start, end)`.
    pub fn between(self, start: i64, end: i64) -> Self {
        self.since(start).before(end)
    }

    /// Order results by oldest first (ascending by `timestamp`).
    pub fn oldest_first(mut self) -> Self {
        self.newest_first = false;
        self
    }

    /// Build the SQL WHERE clause and parameters.
    pub(crate) fn build_where(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref sensor_id) = self.sensor_id {
            conditions.push("sensor_id = ?");
            params.push(Box::new(sensor_id.clone()));
        }

        if let Some(since) = self.since {
            conditions.push("timestamp >= ?");
            params.push(Box::new(since));
        }

        if let Some(before) = self.before {
            conditions.push("timestamp < ?");
            params.push(Box::new(before));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    /// Build the full SQL query.
    pub(crate) fn build_sql(&self) -> String {
        let (where_clause, _) = self.build_where();
        let order = if self.newest_first { "DESC" } else { "ASC" };

        format!(
            "SELECT id, sensor_id, timestamp, temperature, humidity, pressure, battery \
             FROM readings {} ORDER BY timestamp {}, id {}",
            where_clause, order, order
        )
    }
}
