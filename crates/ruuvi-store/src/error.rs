//! Error types for ruuvi-store.

use std::path::PathBuf;

/// Result type for ruuvi-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ruuvi-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The store has not been opened yet.
    #[error("Store is not available")]
    Unavailable,

    /// A reading scheduled for replacement no longer exists.
    #[error("Reading {0} not found")]
    MissingReading(i64),

    /// Failure injected by [`MemoryStore`](crate::MemoryStore).
    #[error("Injected failure: {0}")]
    Injected(String),
}

impl Error {
    /// Returns `true` if this error means the store is not open yet.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable)
    }
}
