use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Builds a configuration with defaults for everything but the database path
    pub fn default_for(database_path: impl Into<String>) -> Self {
        Self {
            github: GithubConfig::default(),
            crawler: CrawlerConfig::default(),
            user_agent: UserAgentConfig::default(),
            output: OutputConfig {
                database_path: database_path.into(),
                last_run_path: default_last_run_path(),
            },
        }
    }
}

/// GitHub endpoints and credentials
#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    /// Base URL of the REST API
    #[serde(rename = "api-endpoint", default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Base URL of the web UI, as found in search result `html_url`s
    #[serde(rename = "web-base", default = "default_web_base")]
    pub web_base: String,

    /// Base URL serving raw file content
    #[serde(rename = "raw-base", default = "default_raw_base")]
    pub raw_base: String,

    /// Name of the environment variable holding the access token
    #[serde(rename = "token-env", default = "default_token_env")]
    pub token_env: String,

    /// Free-text marker term added to every search query
    #[serde(rename = "search-term", default = "default_search_term")]
    pub search_term: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_endpoint: default_api_endpoint(),
            web_base: default_web_base(),
            raw_base: default_raw_base(),
            token_env: default_token_env(),
            search_term: default_search_term(),
        }
    }
}

/// Crawler pacing and concurrency
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Courtesy pause between search pages (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Minimum time between two API requests (milliseconds)
    #[serde(rename = "min-request-interval-ms", default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,

    /// Maximum number of descriptors fetched in parallel within a page
    #[serde(rename = "fetch-concurrency", default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// How often a rate-limited request is retried before the run aborts
    #[serde(rename = "rate-limit-retries", default = "default_rate_limit_retries")]
    pub rate_limit_retries: u32,

    /// Base backoff after a rate-limit response, doubled per attempt (milliseconds)
    #[serde(rename = "rate-limit-backoff-ms", default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Repository owners whose hits are never recorded
    #[serde(rename = "skip-owners", default = "default_skip_owners")]
    pub skip_owners: Vec<String>,
}

impl CrawlerConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: default_page_delay_ms(),
            min_request_interval_ms: default_min_request_interval_ms(),
            fetch_concurrency: default_fetch_concurrency(),
            rate_limit_retries: default_rate_limit_retries(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            skip_owners: default_skip_owners(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default = "default_contact_url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: default_contact_url(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the file recording when the last crawl started
    #[serde(rename = "last-run-path", default = "default_last_run_path")]
    pub last_run_path: String,
}

fn default_api_endpoint() -> String {
    "https://api.github.com".to_string()
}

fn default_web_base() -> String {
    "https://github.com".to_string()
}

fn default_raw_base() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_token_env() -> String {
    "GHACCESSTOKEN".to_string()
}

fn default_search_term() -> String {
    "flogo".to_string()
}

fn default_page_delay_ms() -> u64 {
    10_000
}

fn default_min_request_interval_ms() -> u64 {
    2_000
}

fn default_fetch_concurrency() -> usize {
    4
}

fn default_skip_owners() -> Vec<String> {
    vec!["project-flogo".to_string()]
}

fn default_rate_limit_retries() -> u32 {
    3
}

fn default_rate_limit_backoff_ms() -> u64 {
    60_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_crawler_name() -> String {
    "contrib-crawler".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_contact_url() -> String {
    "https://github.com/search".to_string()
}

fn default_last_run_path() -> String {
    ".crawl".to_string()
}
