//! Descriptor fetcher implementation
//!
//! This module downloads the descriptor behind a search hit:
//! - Deriving the raw-content URL from the hit's web URL
//! - Unauthenticated GET against the raw-content host
//! - Error classification into per-item failures

use crate::config::Config;
use crate::crawler::descriptor::Descriptor;
use crate::github::{build_http_client, RawItem};
use crate::url::raw_content_url;
use crate::{CrawlError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

/// Fetches and validates the descriptor of one search hit
#[async_trait]
pub trait DescriptorFetcher: Send + Sync {
    async fn fetch(&self, item: &RawItem) -> Result<Descriptor>;
}

/// [`DescriptorFetcher`] reading from the raw-content host
pub struct HttpDescriptorFetcher {
    client: Client,
    web_base: String,
    raw_base: String,
}

impl HttpDescriptorFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())
            .map_err(|source| CrawlError::Transport {
                url: config.github.raw_base.clone(),
                source,
            })?;

        Ok(Self {
            client,
            web_base: config.github.web_base.clone(),
            raw_base: config.github.raw_base.clone(),
        })
    }
}

#[async_trait]
impl DescriptorFetcher for HttpDescriptorFetcher {
    /// # Error Mapping
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | `html_url` is not a blob URL | Protocol |
    /// | HTTP 404 | NotFound |
    /// | Other non-2xx | Protocol |
    /// | Network failure | Transport |
    /// | Undecodable or incomplete body | Protocol |
    async fn fetch(&self, item: &RawItem) -> Result<Descriptor> {
        let url = raw_content_url(&item.html_url, &self.web_base, &self.raw_base).ok_or_else(
            || CrawlError::protocol(&item.html_url, "cannot derive raw-content URL"),
        )?;

        tracing::debug!("Fetching descriptor {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| CrawlError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CrawlError::not_found(&url, "HTTP 404"));
        }
        if !status.is_success() {
            return Err(CrawlError::protocol(&url, format!("HTTP status {}", status)));
        }

        let body = response.text().await.map_err(|source| CrawlError::Transport {
            url: url.clone(),
            source,
        })?;

        Descriptor::parse(&url, &body)
    }
}
