//! Crawl controller state definitions
//!
//! This module defines the states a crawl run moves through and the reasons
//! a run can stop.

use std::fmt;

/// Why a crawl run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// A search page came back with no items
    Exhausted,

    /// The last page reported by the pagination metadata was processed
    PagesExhausted,

    /// The last item's repository was older than the caller's timeout
    TimeoutReached,

    /// An operator cancelled the run
    Cancelled,

    /// A fatal error ended the run
    Aborted,
}

impl StopReason {
    /// Returns true if the run ended without a fatal error
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Aborted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::PagesExhausted => "pages_exhausted",
            Self::TimeoutReached => "timeout_reached",
            Self::Cancelled => "cancelled",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents the current state of the crawl controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// No run has started
    Idle,

    /// Requesting a search page
    Paging,

    /// Fetching the descriptors of the current page
    Fetching,

    /// Writing fetched items through the reconciliation policy
    Reconciling,

    /// The run is over
    Stopped(StopReason),
}

impl CrawlState {
    /// Returns true if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }

    /// Returns true if a transition from this state to `next` is allowed
    ///
    /// Any non-terminal state may stop (cancellation and fatal errors can
    /// happen anywhere), but `Stopped` never transitions again.
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        use CrawlState::*;

        match (self, next) {
            (Stopped(_), _) => false,
            (_, Stopped(_)) => true,
            (Idle, Paging) => true,
            (Paging, Fetching) => true,
            (Fetching, Reconciling) => true,
            (Reconciling, Paging) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Paging => write!(f, "paging"),
            Self::Fetching => write!(f, "fetching"),
            Self::Reconciling => write!(f, "reconciling"),
            Self::Stopped(reason) => write!(f, "stopped({})", reason),
        }
    }
}
