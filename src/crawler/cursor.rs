//! Pagination cursor for one crawl run

use crate::contribution::ContributionKind;

/// Tracks where a run is in the search result pages
///
/// Pages are 1-based. The page count is learned from the first response and
/// never revised afterwards.
#[derive(Debug, Clone)]
pub struct CrawlCursor {
    kind: ContributionKind,
    page: u32,
    max_pages: Option<u32>,
    timeout_hours: f64,
}

impl CrawlCursor {
    pub fn new(kind: ContributionKind, timeout_hours: f64) -> Self {
        Self {
            kind,
            page: 1,
            max_pages: None,
            timeout_hours,
        }
    }

    pub fn kind(&self) -> ContributionKind {
        self.kind
    }

    /// The page to request next
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Number of pages, or 1 until a page count has been resolved
    pub fn max_pages(&self) -> u32 {
        self.max_pages.unwrap_or(1)
    }

    /// Records the page count reported by the first response
    ///
    /// A response without pagination metadata means there is a single page.
    pub fn resolve_max_pages(&mut self, last_page: Option<u32>) {
        if self.max_pages.is_none() {
            self.max_pages = Some(last_page.unwrap_or(1).max(1));
        }
    }

    pub fn is_last_page(&self) -> bool {
        self.page >= self.max_pages()
    }

    pub fn advance(&mut self) {
        self.page += 1;
    }

    /// Whether repository age is checked at all; a timeout of 0 disables it
    pub fn checks_staleness(&self) -> bool {
        self.timeout_hours > 0.0
    }

    /// Whether a repository last pushed `age_hours` ago ends the run
    pub fn is_stale(&self, age_hours: f64) -> bool {
        self.checks_staleness() && age_hours > self.timeout_hours
    }
}
