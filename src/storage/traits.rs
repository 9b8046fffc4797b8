//! Storage traits and error types
//!
//! This module defines the trait interface for contribution stores and
//! associated error types.

use crate::contribution::{Contribution, ContributionKind};
use crate::storage::{InsertOutcome, QueryResult};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Contribution not found: {0}")]
    NotFound(String),

    #[error("Only read-only statements may be queried: {0}")]
    NotReadOnly(String),

    #[error("Corrupt row for {reference}: {message}")]
    Corrupt { reference: String, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for contribution store implementations
///
/// The primary key on `ref` is the only concurrency control: an insert that
/// collides reports [`InsertOutcome::Conflict`] instead of overwriting, and
/// the caller decides whether to follow up with an update.
pub trait ContributionStore {
    // ===== Writes =====

    /// Inserts a contribution unless its ref is already stored
    fn insert_contribution(&mut self, contribution: &Contribution) -> StorageResult<InsertOutcome>;

    /// Updates the mutable fields of an existing contribution
    ///
    /// Only `type`, `description`, `url`, `uploadedon` and `showcase` change;
    /// the ref, author and descriptor metadata are immutable once stored.
    ///
    /// # Returns
    ///
    /// `true` if a row with the contribution's ref existed
    fn update_contribution(&mut self, contribution: &Contribution) -> StorageResult<bool>;

    // ===== Reads =====

    /// Gets a contribution by ref
    fn get_contribution(&self, reference: &str) -> StorageResult<Option<Contribution>>;

    /// Gets all contributions ordered by ref
    fn list_contributions(&self) -> StorageResult<Vec<Contribution>>;

    /// Counts stored contributions
    fn count_contributions(&self) -> StorageResult<u64>;

    /// Runs an arbitrary read-only query and renders every value as a string
    fn query(&self, sql: &str) -> StorageResult<QueryResult>;

    // ===== Statistics =====

    /// Gets the authors with the most contributions, most prolific first
    fn top_authors(&self, limit: usize) -> StorageResult<Vec<(String, u64)>>;

    /// Counts contributions per kind
    fn count_by_type(&self) -> StorageResult<Vec<(ContributionKind, u64)>>;
}
