//! GitHub search client
//!
//! This module handles every authenticated API request the crawler makes:
//! - Building the HTTP client with a descriptive user agent
//! - Code search for one contribution kind, one page at a time
//! - Repository metadata lookups for staleness checks
//! - Pacing and bounded backoff on rate-limit responses
//! - Error classification

use crate::config::{Config, UserAgentConfig};
use crate::contribution::ContributionKind;
use crate::github::link;
use crate::github::rate_limit::{backoff_delay, Clock, MinIntervalLimiter, SystemClock};
use crate::github::types::{RepoDetails, SearchPage, SearchResponse};
use crate::url::join;
use crate::{CrawlError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, LINK, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// The search side of the crawl: one page of hits, one repository lookup
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Fetches one page (1-based) of code search results for `kind`
    async fn search(&self, kind: ContributionKind, page: u32) -> Result<SearchPage>;

    /// Gets the time of the most recent push to a repository
    async fn repository_last_pushed_at(&self, full_name: &str) -> Result<DateTime<Utc>>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total per-request timeout
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`SearchClient`] talking to the GitHub REST API
pub struct GithubClient {
    client: Client,
    api_endpoint: String,
    search_term: String,
    token: String,
    clock: Arc<dyn Clock>,
    limiter: MinIntervalLimiter,
    rate_limit_retries: u32,
    rate_limit_backoff: Duration,
}

impl GithubClient {
    /// Creates a client paced by the system clock
    pub fn new(config: &Config, token: impl Into<String>) -> Result<Self> {
        Self::with_clock(config, token, Arc::new(SystemClock))
    }

    /// Creates a client whose pacing and backoff use the given clock
    pub fn with_clock(
        config: &Config,
        token: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())
            .map_err(|source| CrawlError::Transport {
                url: config.github.api_endpoint.clone(),
                source,
            })?;

        Ok(Self {
            client,
            api_endpoint: config.github.api_endpoint.clone(),
            search_term: config.github.search_term.clone(),
            token: token.into(),
            limiter: MinIntervalLimiter::new(config.crawler.min_request_interval(), clock.clone()),
            clock,
            rate_limit_retries: config.crawler.rate_limit_retries,
            rate_limit_backoff: config.crawler.rate_limit_backoff(),
        })
    }

    /// Sends an authenticated GET, retrying the same request on rate limits
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Return response |
    /// | 429, or 403 with rate-limit headers | Back off and retry, up to the configured count |
    /// | 401 / other 403 | Immediate → Auth |
    /// | Other status | Immediate → Protocol |
    /// | Network failure | Immediate → Transport |
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let mut attempt = 0;

        loop {
            self.limiter.acquire().await;
            tracing::debug!("Sending request to {} {:?}", url, query);

            let response = self
                .client
                .get(url)
                .query(query)
                .header(AUTHORIZATION, format!("token {}", self.token))
                .header(ACCEPT, "application/vnd.github+json")
                .send()
                .await
                .map_err(|source| CrawlError::Transport {
                    url: url.to_string(),
                    source,
                })?;

            match classify_response(url, response.status(), response.headers(), self.clock.utc_now()) {
                Ok(()) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.rate_limit_retries => {
                    let delay = backoff_delay(self.rate_limit_backoff, attempt, e.retry_after());
                    attempt += 1;
                    tracing::warn!(
                        "Rate limited at {}, retry {}/{} in {:?}",
                        url,
                        attempt,
                        self.rate_limit_retries,
                        delay
                    );
                    self.clock.sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl SearchClient for GithubClient {
    async fn search(&self, kind: ContributionKind, page: u32) -> Result<SearchPage> {
        let url = join(&self.api_endpoint, "search/code");
        let query = [
            ("q", kind.search_query(&self.search_term)),
            ("sort", "indexed".to_string()),
            ("order", "desc".to_string()),
            ("page", page.to_string()),
        ];

        let response = self.get(&url, &query).await?;

        let last_page = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(link::last_page);

        let body: SearchResponse = decode(&url, response).await?;
        if body.incomplete_results {
            tracing::warn!("Search results for page {} are incomplete", page);
        }

        tracing::debug!(
            "Page {} returned {} of {} items (last page: {:?})",
            page,
            body.items.len(),
            body.total_count,
            last_page
        );

        Ok(SearchPage {
            items: body.items,
            last_page,
        })
    }

    async fn repository_last_pushed_at(&self, full_name: &str) -> Result<DateTime<Utc>> {
        let url = join(&self.api_endpoint, &format!("repos/{}", full_name));
        let response = self.get(&url, &[]).await?;
        let details: RepoDetails = decode(&url, response).await?;

        details
            .last_activity()
            .ok_or_else(|| CrawlError::protocol(&url, "repository has no push timestamp"))
    }
}

/// Reads a response body and decodes it as JSON of the expected shape
async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
    let body = response.text().await.map_err(|source| CrawlError::Transport {
        url: url.to_string(),
        source,
    })?;

    serde_json::from_str(&body).map_err(|e| CrawlError::protocol(url, format!("undecodable body: {}", e)))
}

/// Maps a response status to the crawl error taxonomy
fn classify_response(
    url: &str,
    status: StatusCode,
    headers: &HeaderMap,
    now: DateTime<Utc>,
) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }

    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && (header_str(headers, "x-ratelimit-remaining") == Some("0")
                || headers.contains_key(RETRY_AFTER)));

    if rate_limited {
        return Err(CrawlError::RateLimit {
            url: url.to_string(),
            retry_after: retry_after(headers, now),
        });
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CrawlError::Auth {
            url: url.to_string(),
            status: status.as_u16(),
        }),
        _ => Err(CrawlError::protocol(url, format!("HTTP status {}", status))),
    }
}

/// How long the server asked us to wait, from `retry-after` or `x-ratelimit-reset`
fn retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    if let Some(secs) = header_str(headers, RETRY_AFTER.as_str()).and_then(|v| v.trim().parse::<u64>().ok()) {
        return Some(Duration::from_secs(secs));
    }

    let reset = header_str(headers, "x-ratelimit-reset")?.trim().parse::<i64>().ok()?;
    let wait = reset - now.timestamp();
    (wait > 0).then(|| Duration::from_secs(wait as u64))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
