//! Storage module for persisting contributions
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Conflict-aware inserts keyed on the contribution ref
//! - Conditional updates of the mutable contribution fields
//! - Read-only ad-hoc queries for the query and stats commands

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{ContributionStore, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Result of an insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written
    Inserted,

    /// A row with the same ref already exists and was left untouched
    Conflict,
}

/// Column names and string-rendered rows of an ad-hoc query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}
