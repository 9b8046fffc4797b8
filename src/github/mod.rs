//! GitHub API access
//!
//! - `types`: the slices of API payloads the crawler reads
//! - `link`: pagination metadata from the `Link` header
//! - `rate_limit`: clocks, request pacing and backoff
//! - `client`: the authenticated search client

mod client;
mod link;
mod rate_limit;
mod types;

pub use client::{build_http_client, GithubClient, SearchClient};
pub use link::last_page;
pub use rate_limit::{backoff_delay, Clock, ManualClock, MinIntervalLimiter, SystemClock};
pub use types::{Owner, RawItem, RepoDetails, Repository, SearchPage, SearchResponse};
