//! Main store implementation.

use std::collections::BTreeSet;
use std::path::Path;

use rusqlite::{Connection, Row};
use tracing::{debug, info};

use ruuvi_types::Reading;

use crate::error::{Error, Result};
use crate::models::{BucketReplacement, SensorStats, StoredReading};
use crate::queries::ReadingQuery;
use crate::schema;
use crate::traits::ReadingStore;

/// SQLite-based store for Ruuvi sensor readings.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        // WAL lets the dashboard keep reading while a rewrite transaction is open
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }
}

fn row_to_reading(row: &Row<'_>) -> rusqlite::Result<StoredReading> {
    Ok(StoredReading {
        id: row.get(0)?,
        sensor_id: row.get(1)?,
        timestamp: row.get(2)?,
        temperature: row.get(3)?,
        humidity: row.get(4)?,
        pressure: row.get(5)?,
        battery: row.get(6)?,
    })
}

const INSERT_READING: &str = "INSERT INTO readings (sensor_id, timestamp, temperature, \
                              humidity, pressure, battery) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

// Reading operations
impl Store {
    /// Insert a single reading, returning its row ID.
    pub fn insert_reading(&self, reading: &Reading) -> Result<i64> {
        self.conn.execute(
            INSERT_READING,
            rusqlite::params![
                reading.sensor_id,
                reading.timestamp,
                reading.temperature,
                reading.humidity,
                reading.pressure,
                reading.battery,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Insert many readings in one transaction.
    pub fn insert_readings(&mut self, readings: &[Reading]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT_READING)?;
            for reading in readings {
                stmt.execute(rusqlite::params![
                    reading.sensor_id,
                    reading.timestamp,
                    reading.temperature,
                    reading.humidity,
                    reading.pressure,
                    reading.battery,
                ])?;
            }
        }
        tx.commit()?;

        debug!("Inserted {} readings", readings.len());
        Ok(readings.len())
    }

    /// Query readings with filters.
    pub fn query_readings(&self, query: &ReadingQuery) -> Result<Vec<StoredReading>> {
        let sql = query.build_sql();
        let (_, params) = query.build_where();

        debug!("Executing query: {}", sql);

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let readings = stmt
            .query_map(params_ref.as_slice(), row_to_reading)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(readings)
    }

    /// Count readings, optionally for a single sensor.
    pub fn count_readings(&self, sensor_id: Option<&str>) -> Result<u64> {
        let count: i64 = match sensor_id {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM readings WHERE sensor_id = ?",
                [id],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?,
        };

        Ok(count as u64)
    }

    /// Summarize stored readings per sensor, ordered by sensor ID.
    pub fn sensor_stats(&self) -> Result<Vec<SensorStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT sensor_id, COUNT(*), MIN(timestamp), MAX(timestamp)
             FROM readings GROUP BY sensor_id ORDER BY sensor_id",
        )?;

        let stats = stmt
            .query_map([], |row| {
                Ok(SensorStats {
                    sensor_id: row.get(0)?,
                    count: row.get::<_, i64>(1)? as u64,
                    oldest: row.get(2)?,
                    newest: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(stats)
    }
}

impl ReadingStore for Store {
    fn list_sensor_ids(&self) -> Result<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT DISTINCT sensor_id FROM readings")?;

        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;

        Ok(ids)
    }

    fn read_range(&self, sensor_id: &str, start: i64, end: i64) -> Result<Vec<StoredReading>> {
        let query = ReadingQuery::new()
            .sensor(sensor_id)
            .between(start, end)
            .oldest_first();
        self.query_readings(&query)
    }

    fn replace_buckets(&mut self, replacements: &[BucketReplacement]) -> Result<()> {
        if replacements.is_empty() {
            return Ok(());
        }

        // Dropping `tx` without commit rolls everything back
        let tx = self.conn.transaction()?;
        {
            let mut delete = tx.prepare_cached("DELETE FROM readings WHERE id = ?1")?;
            let mut insert = tx.prepare_cached(INSERT_READING)?;

            for replacement in replacements {
                for id in &replacement.deleted {
                    if delete.execute([id])? == 0 {
                        return Err(Error::MissingReading(*id));
                    }
                }

                let reading = &replacement.inserted;
                insert.execute(rusqlite::params![
                    reading.sensor_id,
                    reading.timestamp,
                    reading.temperature,
                    reading.humidity,
                    reading.pressure,
                    reading.battery,
                ])?;
            }
        }
        tx.commit()?;

        debug!("Committed {} bucket replacement(s)", replacements.len());
        Ok(())
    }
}
