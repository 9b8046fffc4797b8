//! contrib-crawler: discovers extension contributions on GitHub
//!
//! This crate walks the GitHub code search API for activity, trigger and
//! descriptor files, fetches each artifact's descriptor, and reconciles the
//! result into a SQLite store keyed on the artifact's declared `ref`.

pub mod config;
pub mod contribution;
pub mod crawler;
pub mod github;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Authentication rejected for {url} (HTTP {status})")]
    Auth { url: String, status: u16 },

    #[error("Rate limited at {url}")]
    RateLimit {
        url: String,
        retry_after: Option<Duration>,
    },

    #[error("Unexpected response from {url}: {message}")]
    Protocol { url: String, message: String },

    #[error("Descriptor not found at {url}: {message}")]
    NotFound { url: String, message: String },

    #[error("Storage error: {0}")]
    Store(#[from] storage::StorageError),

    #[error("Access token is not set, export {0} before crawling")]
    MissingToken(String),

    #[error("Timeout must be a finite number of hours >= 0, got {0}")]
    InvalidTimeout(f64),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },
}

impl CrawlError {
    /// Creates a protocol error for a response that did not have the expected shape
    pub fn protocol(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Protocol {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Creates a not-found error for a missing descriptor
    pub fn not_found(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::NotFound {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Returns true if a descriptor fetch failing this way only skips its item
    ///
    /// The same kinds are fatal on the search side, where they are never
    /// checked against this.
    pub fn is_per_item(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Protocol { .. } | Self::Transport { .. })
    }

    /// Returns true if the same request may succeed after waiting
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit { .. })
    }

    /// Wait the server asked for before retrying, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use contribution::{Contribution, ContributionKind};
pub use crawler::{run_crawl, Coordinator, RunSummary, StopReason};
pub use state::CrawlState;
pub use storage::{ContributionStore, SqliteStorage};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_failures_are_per_item() {
        assert!(CrawlError::not_found("u", "HTTP 404").is_per_item());
        assert!(CrawlError::protocol("u", "bad json").is_per_item());
        assert!(!CrawlError::Auth {
            url: "u".to_string(),
            status: 401
        }
        .is_per_item());
        assert!(!CrawlError::MissingToken("GHACCESSTOKEN".to_string()).is_per_item());
    }

    #[test]
    fn test_only_rate_limits_are_retryable() {
        let limited = CrawlError::RateLimit {
            url: "u".to_string(),
            retry_after: Some(Duration::from_secs(30)),
        };
        assert!(limited.is_retryable());
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(30)));

        let auth = CrawlError::Auth {
            url: "u".to_string(),
            status: 403,
        };
        assert!(!auth.is_retryable());
        assert_eq!(auth.retry_after(), None);
    }
}
