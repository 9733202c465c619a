//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::CatalogEntry;
use crate::storage::codec::CodecError;
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Failed to store entry '{name}': {source}")]
    StoreFailed {
        name: String,
        #[source]
        source: Box<StorageError>,
    },

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Entries are keyed by name; dependency rows are shared between entries and
/// keyed by (name, version constraint, kind).
pub trait Storage {
    // ===== Entries =====

    /// Returns true if an entry with this name is stored
    fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Loads a stored entry with its dependencies and links
    ///
    /// Returns `StorageError::NotFound` for unknown names.
    fn load(&self, name: &str) -> StorageResult<CatalogEntry>;

    /// Stores an entry with its links and dependencies in one transaction
    ///
    /// Storing a name that already exists writes nothing and returns the
    /// existing id. On success the entry and its dependencies carry their ids.
    /// Any failure rolls the whole entry back and is reported as
    /// `StorageError::StoreFailed`.
    fn store(&mut self, entry: &mut CatalogEntry) -> StorageResult<i64>;

    // ===== Statistics =====

    fn count_entries(&self) -> StorageResult<u64>;

    fn count_dependencies(&self) -> StorageResult<u64>;

    fn count_links(&self) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new harvest run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Records the final status of a run
    fn finish_run(&mut self, run_id: i64, status: RunStatus, entries_stored: u64)
        -> StorageResult<()>;
}
