//! Per-run counters

use crate::contribution::ContributionKind;
use crate::state::StopReason;
use std::fmt;

/// What a crawl run did and why it stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub kind: ContributionKind,
    /// New refs inserted
    pub accepted: u64,
    /// Known refs refreshed from their own source
    pub updated: u64,
    /// Known refs found at a foreign source
    pub rejected: u64,
    /// Items whose descriptor could not be fetched or validated
    pub fetch_failed: u64,
    /// Hits dropped before fetching: forks, test files, skipped owners
    pub skipped: u64,
    pub pages_visited: u32,
    pub stop_reason: StopReason,
}

impl RunSummary {
    pub(crate) fn new(kind: ContributionKind) -> Self {
        Self {
            kind,
            accepted: 0,
            updated: 0,
            rejected: 0,
            fetch_failed: 0,
            skipped: 0,
            pages_visited: 0,
            stop_reason: StopReason::Aborted,
        }
    }

    /// Items that reached reconciliation
    pub fn reconciled(&self) -> u64 {
        self.accepted + self.updated + self.rejected
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} crawl {} after {} page(s): {} accepted, {} updated, {} rejected, {} failed, {} skipped",
            self.kind,
            self.stop_reason,
            self.pages_visited,
            self.accepted,
            self.updated,
            self.rejected,
            self.fetch_failed,
            self.skipped
        )
    }
}
