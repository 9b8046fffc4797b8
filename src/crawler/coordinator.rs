//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that drives one run:
//! - Paging through the code search results of one kind
//! - Fetching the descriptors of each page with bounded concurrency
//! - Reconciling every fetched item into the store, in item order
//! - Stopping on exhaustion, staleness, the last page or cancellation
//! - Pausing between pages

use crate::config::Config;
use crate::contribution::{Contribution, ContributionKind};
use crate::crawler::cursor::CrawlCursor;
use crate::crawler::descriptor::Descriptor;
use crate::crawler::fetcher::DescriptorFetcher;
use crate::crawler::reconcile::{reconcile, Reconciliation};
use crate::crawler::summary::RunSummary;
use crate::github::{Clock, RawItem, SearchClient};
use crate::state::{CrawlState, StopReason};
use crate::storage::ContributionStore;
use crate::url::source_url;
use crate::{CrawlError, Result};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Tunables the coordinator reads from the configuration
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub page_delay: Duration,
    pub fetch_concurrency: usize,
    pub web_base: String,
    pub skip_owners: Vec<String>,
}

impl CoordinatorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_delay: config.crawler.page_delay(),
            fetch_concurrency: config.crawler.fetch_concurrency.max(1),
            web_base: config.github.web_base.clone(),
            skip_owners: config.crawler.skip_owners.clone(),
        }
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<S: ContributionStore> {
    search: Arc<dyn SearchClient>,
    fetcher: Arc<dyn DescriptorFetcher>,
    store: S,
    clock: Arc<dyn Clock>,
    settings: CoordinatorSettings,
    cancel: CancellationToken,
    state: CrawlState,
    summary: Option<RunSummary>,
}

impl<S: ContributionStore> Coordinator<S> {
    pub fn new(
        search: Arc<dyn SearchClient>,
        fetcher: Arc<dyn DescriptorFetcher>,
        store: S,
        clock: Arc<dyn Clock>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            search,
            fetcher,
            store,
            clock,
            settings,
            cancel: CancellationToken::new(),
            state: CrawlState::Idle,
            summary: None,
        }
    }

    /// Uses `cancel` to stop the run at the next page boundary or pending search
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Summary of the most recent run, including one that aborted
    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one crawl of `kind`
    ///
    /// A positive `timeout_hours` stops the run once the last item of a page
    /// comes from a repository not pushed to within that many hours; 0 walks
    /// every page.
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - The run stopped normally
    /// * `Err(CrawlError)` - A fatal search or store failure aborted the run
    pub async fn run(&mut self, kind: ContributionKind, timeout_hours: f64) -> Result<RunSummary> {
        self.summary = None;
        if !timeout_hours.is_finite() || timeout_hours < 0.0 {
            return Err(CrawlError::InvalidTimeout(timeout_hours));
        }

        // Each run starts from a fresh cursor
        self.state = CrawlState::Idle;
        let mut summary = RunSummary::new(kind);

        tracing::info!("Starting {} crawl (timeout: {}h)", kind, timeout_hours);

        let outcome = self
            .crawl(CrawlCursor::new(kind, timeout_hours), &mut summary)
            .await;

        let reason = match &outcome {
            Ok(reason) => *reason,
            Err(_) => StopReason::Aborted,
        };
        if !self.state.is_terminal() {
            self.state = CrawlState::Stopped(reason);
        }

        summary.stop_reason = reason;
        self.summary = Some(summary.clone());

        match outcome {
            Ok(_) => {
                tracing::info!("{}", summary);
                Ok(summary)
            }
            Err(e) => {
                tracing::error!("{} crawl aborted on page {}: {}", kind, summary.pages_visited, e);
                Err(e)
            }
        }
    }

    async fn crawl(
        &mut self,
        mut cursor: CrawlCursor,
        summary: &mut RunSummary,
    ) -> Result<StopReason> {
        self.transition(CrawlState::Paging)?;

        loop {
            if self.cancel.is_cancelled() {
                return self.stop(StopReason::Cancelled);
            }

            let searched = self
                .until_cancelled(self.search.search(cursor.kind(), cursor.page()))
                .await;
            let page = match searched {
                Some(page) => page?,
                None => return self.stop(StopReason::Cancelled),
            };
            summary.pages_visited += 1;

            if cursor.page() == 1 {
                cursor.resolve_max_pages(page.last_page);
                tracing::info!("Search reports {} page(s)", cursor.max_pages());
            }

            if page.items.is_empty() {
                tracing::info!("Page {} is empty", cursor.page());
                return self.stop(StopReason::Exhausted);
            }

            let wanted: Vec<RawItem> = page
                .items
                .iter()
                .filter(|item| match skip_reason(item, &self.settings.skip_owners) {
                    Some(reason) => {
                        tracing::debug!("Ignoring {}: {}", item.html_url, reason);
                        summary.skipped += 1;
                        false
                    }
                    None => true,
                })
                .cloned()
                .collect();

            self.transition(CrawlState::Fetching)?;
            let fetched = self.fetch_page(&wanted).await;

            self.transition(CrawlState::Reconciling)?;
            for (item, result) in wanted.iter().zip(fetched) {
                match result {
                    Ok(descriptor) => {
                        self.reconcile_item(cursor.kind(), item, descriptor, summary)?
                    }
                    Err(e) if e.is_per_item() => {
                        tracing::warn!("Skipping {}: {}", item.html_url, e);
                        summary.fetch_failed += 1;
                    }
                    Err(e) => return Err(e),
                }
            }

            if let Some(last) = page.items.last() {
                let stale = self.until_cancelled(self.is_stale(last, &cursor)).await;
                match stale {
                    Some(true) => return self.stop(StopReason::TimeoutReached),
                    Some(false) => {}
                    None => return self.stop(StopReason::Cancelled),
                }
            }

            if cursor.is_last_page() {
                return self.stop(StopReason::PagesExhausted);
            }

            cursor.advance();
            self.transition(CrawlState::Paging)?;

            if !self.pause().await {
                return self.stop(StopReason::Cancelled);
            }
        }
    }

    /// Fetches all descriptors of a page, results in item order
    async fn fetch_page(&self, items: &[RawItem]) -> Vec<Result<Descriptor>> {
        let fetcher = &self.fetcher;

        stream::iter(items)
            .map(|item| fetcher.fetch(item))
            .buffered(self.settings.fetch_concurrency)
            .collect()
            .await
    }

    fn reconcile_item(
        &mut self,
        kind: ContributionKind,
        item: &RawItem,
        descriptor: Descriptor,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let today = self.clock.utc_now().date_naive();
        let candidate = build_contribution(kind, item, descriptor, &self.settings.web_base, today);

        match reconcile(&mut self.store, &candidate)? {
            Reconciliation::Accepted => summary.accepted += 1,
            Reconciliation::Updated => summary.updated += 1,
            Reconciliation::Rejected(_) => summary.rejected += 1,
        }

        Ok(())
    }

    /// Checks whether the repository of `item` is older than the timeout
    ///
    /// A failed lookup is logged and counts as not stale.
    async fn is_stale(&self, item: &RawItem, cursor: &CrawlCursor) -> bool {
        if !cursor.checks_staleness() {
            return false;
        }

        let repo = &item.repository.full_name;
        match self.search.repository_last_pushed_at(repo).await {
            Ok(pushed_at) => {
                let age = self.clock.utc_now() - pushed_at;
                let age_hours = age.num_seconds() as f64 / 3600.0;
                let stale = cursor.is_stale(age_hours);
                tracing::debug!("{} last pushed {:.1}h ago (stale: {})", repo, age_hours, stale);
                if stale {
                    tracing::info!("{} has not been pushed to in {:.1}h, stopping", repo, age_hours);
                }
                stale
            }
            Err(e) => {
                tracing::warn!("Could not check age of {}: {}", repo, e);
                false
            }
        }
    }

    /// Awaits `work` unless the run is cancelled first
    ///
    /// Search calls may sit in rate-limit backoff for as long as the server
    /// asks; they all go through here.
    async fn until_cancelled<T>(&self, work: impl Future<Output = T>) -> Option<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            out = work => Some(out),
        }
    }

    /// Waits out the inter-page delay
    ///
    /// Returns false if the run was cancelled while waiting.
    async fn pause(&self) -> bool {
        if self.settings.page_delay.is_zero() {
            return !self.cancel.is_cancelled();
        }

        tracing::debug!("Pausing {:?} before next page", self.settings.page_delay);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = self.clock.sleep(self.settings.page_delay) => true,
        }
    }

    fn transition(&mut self, next: CrawlState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("{} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    fn stop(&mut self, reason: StopReason) -> Result<StopReason> {
        self.transition(CrawlState::Stopped(reason))?;
        Ok(reason)
    }
}

/// Why a search hit is dropped before its descriptor is fetched, if it is
pub fn skip_reason(item: &RawItem, skip_owners: &[String]) -> Option<&'static str> {
    if item.repository.fork {
        Some("forked repository")
    } else if item.name.contains("_test") {
        Some("test file")
    } else if skip_owners.iter().any(|owner| *owner == item.repository.owner.login) {
        Some("skipped owner")
    } else {
        None
    }
}

/// Assembles the stored record for a fetched descriptor
pub fn build_contribution(
    kind: ContributionKind,
    item: &RawItem,
    descriptor: Descriptor,
    web_base: &str,
    uploaded_on: NaiveDate,
) -> Contribution {
    Contribution {
        reference: descriptor.reference,
        name: descriptor.name,
        contribution_type: kind,
        description: descriptor.description,
        source_url: source_url(web_base, &item.repository.full_name, &item.path),
        author: item.repository.owner.login.clone(),
        uploaded_on,
        showcase_enabled: false,
        version: descriptor.version,
        title: descriptor.title,
        homepage: descriptor.homepage,
        legacy: kind.is_legacy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{ManualClock, Owner, Repository, SearchPage};
    use crate::storage::SqliteStorage;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    const WEB: &str = "https://github.com";

    fn item(owner: &str, repo: &str, dir: &str) -> RawItem {
        RawItem {
            name: "activity.json".to_string(),
            path: format!("{}/activity.json", dir),
            html_url: format!("{}/{}/{}/blob/master/{}/activity.json", WEB, owner, repo, dir),
            repository: Repository {
                full_name: format!("{}/{}", owner, repo),
                owner: Owner {
                    login: owner.to_string(),
                },
                fork: false,
            },
        }
    }

    fn page_items(page: u32, count: usize) -> Vec<RawItem> {
        (0..count)
            .map(|i| item("acme", "widgets", &format!("p{}/a{}", page, i)))
            .collect()
    }

    /// Serves canned pages and records which pages were requested
    struct MockSearch {
        pages: HashMap<u32, Vec<RawItem>>,
        last_page: Option<u32>,
        pushed_at: Option<DateTime<Utc>>,
        fail_on_page: Option<u32>,
        hang_on_page: Option<u32>,
        cancel_after_page: Option<(u32, CancellationToken)>,
        requested: Mutex<Vec<u32>>,
    }

    impl MockSearch {
        fn new(pages: Vec<Vec<RawItem>>) -> Self {
            let last_page = if pages.len() > 1 {
                Some(pages.len() as u32)
            } else {
                None
            };
            Self {
                pages: pages
                    .into_iter()
                    .enumerate()
                    .map(|(i, items)| (i as u32 + 1, items))
                    .collect(),
                last_page,
                pushed_at: None,
                fail_on_page: None,
                hang_on_page: None,
                cancel_after_page: None,
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchClient for MockSearch {
        async fn search(&self, _kind: ContributionKind, page: u32) -> Result<SearchPage> {
            self.requested.lock().unwrap().push(page);

            if self.fail_on_page == Some(page) {
                return Err(CrawlError::Auth {
                    url: "mock".to_string(),
                    status: 401,
                });
            }
            if self.hang_on_page == Some(page) {
                // stands in for a long rate-limit backoff
                std::future::pending::<()>().await;
            }
            if let Some((after, token)) = &self.cancel_after_page {
                if *after == page {
                    token.cancel();
                }
            }

            Ok(SearchPage {
                items: self.pages.get(&page).cloned().unwrap_or_default(),
                last_page: self.last_page,
            })
        }

        async fn repository_last_pushed_at(&self, full_name: &str) -> Result<DateTime<Utc>> {
            self.pushed_at
                .ok_or_else(|| CrawlError::protocol(full_name, "no metadata"))
        }
    }

    /// Builds a descriptor whose ref matches the item's location
    struct MockFetcher {
        failing: HashSet<String>,
        slow: HashSet<String>,
        fetched: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn new() -> Self {
            Self {
                failing: HashSet::new(),
                slow: HashSet::new(),
                fetched: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DescriptorFetcher for MockFetcher {
        async fn fetch(&self, item: &RawItem) -> Result<Descriptor> {
            if self.slow.contains(&item.html_url) {
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
            self.fetched.lock().unwrap().push(item.html_url.clone());

            if self.failing.contains(&item.html_url) {
                return Err(CrawlError::not_found(&item.html_url, "HTTP 404"));
            }

            let dir = item.path.trim_end_matches("/activity.json");
            Ok(Descriptor {
                reference: format!("github.com/acme/widgets/{}", dir),
                name: dir.replace('/', "-"),
                descriptor_type: "flogo:activity".to_string(),
                version: "0.0.1".to_string(),
                title: dir.to_string(),
                description: String::new(),
                homepage: String::new(),
            })
        }
    }

    fn settings(page_delay: Duration) -> CoordinatorSettings {
        CoordinatorSettings {
            page_delay,
            fetch_concurrency: 4,
            web_base: WEB.to_string(),
            skip_owners: vec!["project-flogo".to_string()],
        }
    }

    fn coordinator(
        search: Arc<MockSearch>,
        fetcher: Arc<MockFetcher>,
        clock: Arc<ManualClock>,
        page_delay: Duration,
    ) -> Coordinator<SqliteStorage> {
        Coordinator::new(
            search,
            fetcher,
            SqliteStorage::new_in_memory().unwrap(),
            clock,
            settings(page_delay),
        )
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc::now()))
    }

    #[tokio::test]
    async fn test_walks_every_page_without_timeout() {
        let search = Arc::new(MockSearch::new(vec![
            page_items(1, 2),
            page_items(2, 2),
            page_items(3, 2),
        ]));
        let clock = clock();
        let delay = Duration::from_secs(10);
        let mut coordinator =
            coordinator(search.clone(), Arc::new(MockFetcher::new()), clock.clone(), delay);

        let summary = coordinator.run(ContributionKind::Activity, 0.0).await.unwrap();

        assert_eq!(summary.stop_reason, StopReason::PagesExhausted);
        assert_eq!(summary.pages_visited, 3);
        assert_eq!(summary.accepted, 6);
        assert_eq!(search.requested(), vec![1, 2, 3]);
        assert_eq!(clock.sleeps(), vec![delay, delay]);
        assert_eq!(
            coordinator.state(),
            CrawlState::Stopped(StopReason::PagesExhausted)
        );
    }

    #[tokio::test]
    async fn test_single_page_without_pagination_metadata() {
        let search = Arc::new(MockSearch::new(vec![page_items(1, 3)]));
        let mut coordinator =
            coordinator(search.clone(), Arc::new(MockFetcher::new()), clock(), Duration::ZERO);

        let summary = coordinator.run(ContributionKind::Activity, 0.0).await.unwrap();

        assert_eq!(summary.stop_reason, StopReason::PagesExhausted);
        assert_eq!(search.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_stale_repository_stops_after_first_page() {
        let clock = clock();
        let mut search = MockSearch::new(vec![page_items(1, 2), page_items(2, 2)]);
        search.last_page = Some(5);
        search.pushed_at = Some(clock.utc_now() - chrono::Duration::hours(1000));
        let search = Arc::new(search);

        let mut coordinator =
            coordinator(search.clone(), Arc::new(MockFetcher::new()), clock, Duration::ZERO);

        let summary = coordinator.run(ContributionKind::Trigger, 24.0).await.unwrap();

        assert_eq!(summary.stop_reason, StopReason::TimeoutReached);
        assert_eq!(summary.pages_visited, 1);
        // the page that triggered the stop is still fully reconciled
        assert_eq!(summary.accepted, 2);
        assert_eq!(search.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_recent_repository_keeps_paging() {
        let clock = clock();
        let mut search = MockSearch::new(vec![page_items(1, 1), page_items(2, 1)]);
        search.pushed_at = Some(clock.utc_now() - chrono::Duration::hours(1));
        let search = Arc::new(search);

        let mut coordinator =
            coordinator(search, Arc::new(MockFetcher::new()), clock, Duration::ZERO);

        let summary = coordinator.run(ContributionKind::Activity, 24.0).await.unwrap();
        assert_eq!(summary.stop_reason, StopReason::PagesExhausted);
        assert_eq!(summary.pages_visited, 2);
    }

    #[tokio::test]
    async fn test_failed_staleness_lookup_is_not_stale() {
        // pushed_at is None, so every metadata lookup fails
        let search = Arc::new(MockSearch::new(vec![page_items(1, 1), page_items(2, 1)]));
        let mut coordinator =
            coordinator(search, Arc::new(MockFetcher::new()), clock(), Duration::ZERO);

        let summary = coordinator.run(ContributionKind::Activity, 24.0).await.unwrap();
        assert_eq!(summary.stop_reason, StopReason::PagesExhausted);
        assert_eq!(summary.pages_visited, 2);
    }

    #[tokio::test]
    async fn test_failed_descriptor_is_skipped() {
        let items = page_items(1, 5);
        let mut fetcher = MockFetcher::new();
        fetcher.failing.insert(items[2].html_url.clone());

        let search = Arc::new(MockSearch::new(vec![items, page_items(2, 2)]));
        let mut coordinator =
            coordinator(search.clone(), Arc::new(fetcher), clock(), Duration::ZERO);

        let summary = coordinator.run(ContributionKind::Activity, 0.0).await.unwrap();

        // the failure on page 1 neither aborts the run nor stops paging
        assert_eq!(summary.pages_visited, 2);
        assert_eq!(search.requested(), vec![1, 2]);
        assert_eq!(summary.accepted, 6);
        assert_eq!(summary.fetch_failed, 1);
        assert_eq!(summary.stop_reason, StopReason::PagesExhausted);
        assert_eq!(coordinator.store().count_contributions().unwrap(), 6);
    }

    #[tokio::test]
    async fn test_forks_test_files_and_skipped_owners_are_ignored() {
        let kept = item("acme", "widgets", "kept");

        let mut forked = item("someone", "widgets", "forked");
        forked.repository.fork = true;

        let mut test_file = item("acme", "widgets", "tested");
        test_file.name = "activity_test.json".to_string();

        let upstream = item("project-flogo", "contrib", "log");

        let fetcher = Arc::new(MockFetcher::new());
        let search = Arc::new(MockSearch::new(vec![vec![kept.clone(), forked, test_file, upstream]]));
        let mut coordinator = coordinator(search, fetcher.clone(), clock(), Duration::ZERO);

        let summary = coordinator.run(ContributionKind::Activity, 0.0).await.unwrap();

        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.fetch_failed, 0);
        assert_eq!(*fetcher.fetched.lock().unwrap(), vec![kept.html_url]);
        assert_eq!(coordinator.store().count_contributions().unwrap(), 1);
    }

    #[test]
    fn test_skip_reason() {
        let owners = vec!["project-flogo".to_string()];
        let mut raw = item("acme", "widgets", "a");
        assert_eq!(skip_reason(&raw, &owners), None);
        assert_eq!(skip_reason(&raw, &[]), None);

        raw.repository.fork = true;
        assert_eq!(skip_reason(&raw, &owners), Some("forked repository"));

        let mut raw = item("acme", "widgets", "a");
        raw.name = "trigger_test.json".to_string();
        assert_eq!(skip_reason(&raw, &owners), Some("test file"));

        let raw = item("project-flogo", "contrib", "a");
        assert_eq!(skip_reason(&raw, &owners), Some("skipped owner"));
        assert_eq!(skip_reason(&raw, &[]), None);
    }

    #[tokio::test]
    async fn test_second_run_accepts_nothing_new() {
        let search = Arc::new(MockSearch::new(vec![page_items(1, 3), page_items(2, 2)]));
        let mut coordinator =
            coordinator(search, Arc::new(MockFetcher::new()), clock(), Duration::ZERO);

        let first = coordinator.run(ContributionKind::Activity, 0.0).await.unwrap();
        let stored = coordinator.store().list_contributions().unwrap();
        let second = coordinator.run(ContributionKind::Activity, 0.0).await.unwrap();

        assert_eq!(first.accepted, 5);
        assert_eq!(second.accepted, 0);
        assert_eq!(second.updated, 5);
        assert_eq!(second.rejected, 0);
        assert_eq!(coordinator.store().list_contributions().unwrap(), stored);
    }

    #[tokio::test]
    async fn test_empty_page_exhausts_run() {
        let search = Arc::new(MockSearch::new(vec![Vec::new()]));
        let mut coordinator =
            coordinator(search, Arc::new(MockFetcher::new()), clock(), Duration::ZERO);

        let summary = coordinator.run(ContributionKind::Contribution, 0.0).await.unwrap();

        assert_eq!(summary.stop_reason, StopReason::Exhausted);
        assert_eq!(summary.pages_visited, 1);
        assert_eq!(summary.reconciled(), 0);
    }

    #[tokio::test]
    async fn test_search_failure_aborts_run() {
        let mut search = MockSearch::new(vec![page_items(1, 2), page_items(2, 2)]);
        search.fail_on_page = Some(2);
        let mut coordinator =
            coordinator(Arc::new(search), Arc::new(MockFetcher::new()), clock(), Duration::ZERO);

        let result = coordinator.run(ContributionKind::Activity, 0.0).await;

        assert!(matches!(result, Err(CrawlError::Auth { status: 401, .. })));
        let summary = coordinator.summary().unwrap();
        assert_eq!(summary.stop_reason, StopReason::Aborted);
        assert_eq!(summary.accepted, 2);
        assert_eq!(coordinator.state(), CrawlState::Stopped(StopReason::Aborted));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_page() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let search = Arc::new(MockSearch::new(vec![page_items(1, 1)]));
        let mut coordinator =
            coordinator(search.clone(), Arc::new(MockFetcher::new()), clock(), Duration::ZERO)
                .with_cancellation(cancel);

        let summary = coordinator.run(ContributionKind::Activity, 0.0).await.unwrap();

        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.pages_visited, 0);
        assert!(search.requested().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_during_pause() {
        let cancel = CancellationToken::new();
        let mut search = MockSearch::new(vec![page_items(1, 1), page_items(2, 1)]);
        search.cancel_after_page = Some((1, cancel.clone()));
        let search = Arc::new(search);

        let clock = clock();
        let mut coordinator = coordinator(
            search.clone(),
            Arc::new(MockFetcher::new()),
            clock.clone(),
            Duration::from_secs(10),
        )
        .with_cancellation(cancel);

        let summary = coordinator.run(ContributionKind::Activity, 0.0).await.unwrap();

        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.accepted, 1);
        assert_eq!(search.requested(), vec![1]);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_while_search_is_waiting() {
        let cancel = CancellationToken::new();
        let mut search = MockSearch::new(vec![page_items(1, 1), page_items(2, 1)]);
        search.hang_on_page = Some(2);
        let search = Arc::new(search);

        let mut coordinator =
            coordinator(search.clone(), Arc::new(MockFetcher::new()), clock(), Duration::ZERO)
                .with_cancellation(cancel.clone());

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let summary = tokio::time::timeout(
            Duration::from_secs(5),
            coordinator.run(ContributionKind::Activity, 0.0),
        )
        .await
        .expect("run should stop once cancelled")
        .unwrap();

        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert_eq!(summary.pages_visited, 1);
        assert_eq!(summary.accepted, 1);
        assert_eq!(search.requested(), vec![1, 2]);
        assert_eq!(coordinator.state(), CrawlState::Stopped(StopReason::Cancelled));
    }

    #[tokio::test]
    async fn test_items_reconciled_in_search_order() {
        // Same ref found upstream first and in a fork second. The upstream
        // fetch is slower, but it must still be reconciled first.
        let upstream = item("acme", "widgets", "extras/foo");
        let fork = item("someone", "widgets-fork", "extras/foo");

        let mut fetcher = MockFetcher::new();
        fetcher.slow.insert(upstream.html_url.clone());
        let fetcher = Arc::new(fetcher);

        let search = Arc::new(MockSearch::new(vec![vec![upstream, fork]]));
        let mut coordinator = coordinator(search, fetcher.clone(), clock(), Duration::ZERO);

        let summary = coordinator.run(ContributionKind::Activity, 0.0).await.unwrap();

        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.rejected, 1);
        let stored = coordinator
            .store()
            .get_contribution("github.com/acme/widgets/extras/foo")
            .unwrap()
            .unwrap();
        assert_eq!(stored.author, "acme");
        assert_eq!(
            stored.source_url,
            "https://github.com/acme/widgets/tree/master/extras/foo/"
        );
        // the fork's fetch completed first
        assert!(fetcher.fetched.lock().unwrap()[0].contains("widgets-fork"));
    }

    #[tokio::test]
    async fn test_negative_timeout_is_rejected() {
        let search = Arc::new(MockSearch::new(vec![page_items(1, 1)]));
        let mut coordinator =
            coordinator(search.clone(), Arc::new(MockFetcher::new()), clock(), Duration::ZERO);

        let result = coordinator.run(ContributionKind::Activity, -1.0).await;

        assert!(matches!(result, Err(CrawlError::InvalidTimeout(_))));
        assert!(search.requested().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_run_clears_previous_summary() {
        let search = Arc::new(MockSearch::new(vec![page_items(1, 1)]));
        let mut coordinator =
            coordinator(search, Arc::new(MockFetcher::new()), clock(), Duration::ZERO);

        coordinator.run(ContributionKind::Activity, 0.0).await.unwrap();
        assert!(coordinator.summary().is_some());

        let result = coordinator.run(ContributionKind::Activity, f64::NAN).await;

        assert!(matches!(result, Err(CrawlError::InvalidTimeout(_))));
        assert!(coordinator.summary().is_none());
    }

    #[test]
    fn test_build_contribution() {
        let raw = item("acme", "widgets", "extras/foo");
        let descriptor = Descriptor {
            reference: "github.com/acme/widgets/extras/foo".to_string(),
            name: "foo".to_string(),
            descriptor_type: "flogo:activity".to_string(),
            version: "1.2.3".to_string(),
            title: "Foo".to_string(),
            description: "does foo".to_string(),
            homepage: "https://acme.example".to_string(),
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let c = build_contribution(ContributionKind::Trigger, &raw, descriptor, WEB, today);

        assert_eq!(c.source_url, "https://github.com/acme/widgets/tree/master/extras/foo/");
        assert_eq!(c.author, "acme");
        assert_eq!(c.contribution_type, ContributionKind::Trigger);
        assert!(c.legacy);
        assert!(!c.showcase_enabled);
        assert_eq!(c.uploaded_on, today);
    }
}
