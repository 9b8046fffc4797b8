//! Crawler module for contribution discovery
//!
//! This module contains the core crawling logic, including:
//! - Descriptor fetching and validation
//! - Reconciliation of fetched items against the store
//! - Pagination and stop conditions
//! - Overall crawl coordination

mod coordinator;
mod cursor;
mod descriptor;
mod fetcher;
mod reconcile;
mod summary;

pub use coordinator::{build_contribution, skip_reason, Coordinator, CoordinatorSettings};
pub use cursor::CrawlCursor;
pub use descriptor::Descriptor;
pub use fetcher::{DescriptorFetcher, HttpDescriptorFetcher};
pub use reconcile::{reconcile, Reconciliation, RejectReason};
pub use summary::RunSummary;

pub use crate::state::StopReason;

use crate::config::{resolve_token, Config};
use crate::contribution::ContributionKind;
use crate::github::{Clock, GithubClient, SystemClock};
use crate::storage::SqliteStorage;
use crate::{CrawlError, Result};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Resolve the access token, failing before any request if it is unset
/// 2. Record the last-run timestamp
/// 3. Open the store
/// 4. Build the search client and descriptor fetcher
/// 5. Walk the search results of `kind`
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `kind` - Which descriptor kind to discover
/// * `timeout_hours` - Recency window; 0 disables the staleness stop
/// * `cancel` - Cancels the run at the next page boundary
pub async fn run_crawl(
    config: &Config,
    kind: ContributionKind,
    timeout_hours: f64,
    cancel: CancellationToken,
) -> Result<RunSummary> {
    let token = resolve_token(&config.github)?;
    if !timeout_hours.is_finite() || timeout_hours < 0.0 {
        return Err(CrawlError::InvalidTimeout(timeout_hours));
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    record_last_run(Path::new(&config.output.last_run_path), clock.as_ref());

    let store = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let search = GithubClient::with_clock(config, token, clock.clone())?;
    let fetcher = HttpDescriptorFetcher::new(config)?;

    let mut coordinator = Coordinator::new(
        Arc::new(search),
        Arc::new(fetcher),
        store,
        clock,
        CoordinatorSettings::from_config(config),
    )
    .with_cancellation(cancel);

    coordinator.run(kind, timeout_hours).await
}

/// Writes the start time of this run, ignoring failures
fn record_last_run(path: &Path, clock: &dyn Clock) {
    let stamp = clock.utc_now().to_rfc3339();
    if let Err(e) = std::fs::write(path, format!("{}\n", stamp)) {
        tracing::warn!("Could not record last run in {}: {}", path.display(), e);
    }
}
