//! Output module for the read-side commands
//!
//! This module handles:
//! - Contribution statistics for the stats command
//! - Tab-separated rendering for the query command

mod query;
pub mod stats;

pub use query::{format_query_result, print_query_result};
pub use stats::{format_statistics, load_statistics, print_statistics, ContributionStatistics};
