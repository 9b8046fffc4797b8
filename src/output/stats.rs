//! Statistics generation from the contribution database
//!
//! This module provides functionality for extracting and displaying
//! contribution statistics from the storage layer.

use crate::contribution::ContributionKind;
use crate::storage::{ContributionStore, StorageResult};
use std::fmt::Write;

/// Number of authors listed by the stats command
pub const TOP_AUTHORS: usize = 5;

/// Contribution statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionStatistics {
    /// Total number of stored contributions
    pub total: u64,

    /// Count per kind, every kind present even when zero
    pub by_type: Vec<(ContributionKind, u64)>,

    /// Most prolific authors, descending
    pub top_authors: Vec<(String, u64)>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
pub fn load_statistics(storage: &dyn ContributionStore) -> StorageResult<ContributionStatistics> {
    let total = storage.count_contributions()?;
    let counted = storage.count_by_type()?;

    let by_type = ContributionKind::all()
        .into_iter()
        .map(|kind| {
            let count = counted
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, c)| *c)
                .unwrap_or(0);
            (kind, count)
        })
        .collect();

    let top_authors = storage.top_authors(TOP_AUTHORS)?;

    Ok(ContributionStatistics {
        total,
        by_type,
        top_authors,
    })
}

/// Renders statistics as the text printed by the stats command
pub fn format_statistics(stats: &ContributionStatistics) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Contribution Statistics ===\n");
    let _ = writeln!(out, "Total contributions: {}\n", stats.total);

    let _ = writeln!(out, "By type:");
    for (kind, count) in &stats.by_type {
        let _ = writeln!(out, "  {}: {}", kind, count);
    }

    if !stats.top_authors.is_empty() {
        let _ = writeln!(out, "\nTop authors:");
        for (rank, (author, count)) in stats.top_authors.iter().enumerate() {
            let _ = writeln!(out, "  {}. {} ({})", rank + 1, author, count);
        }
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ContributionStatistics) {
    print!("{}", format_statistics(stats));
}
