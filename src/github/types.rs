//! Typed GitHub API payloads
//!
//! Only the fields the crawler reads are modelled; serde ignores the rest.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Body of a `/search/code` response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<RawItem>,
}

/// One code search hit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawItem {
    /// File name, e.g. `activity.json`
    pub name: String,
    /// Repository-relative path of the file
    pub path: String,
    /// Web UI URL of the file
    pub html_url: String,
    pub repository: Repository,
}

/// Repository summary embedded in a search hit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Repository {
    /// `{owner}/{repo}`
    pub full_name: String,
    pub owner: Owner,
    #[serde(default)]
    pub fork: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// Body of a `/repos/{owner}/{repo}` response
#[derive(Debug, Clone, Deserialize)]
pub struct RepoDetails {
    pub full_name: String,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RepoDetails {
    /// Most recent push, falling back to the last metadata update
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.pushed_at.or(self.updated_at)
    }
}

/// One page of search results
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub items: Vec<RawItem>,
    /// Page number of the `last` link relation, if the response had one
    pub last_page: Option<u32>,
}
