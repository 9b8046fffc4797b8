//! Contribution records and kinds
//!
//! A contribution is one discovered extension artifact. Its kind selects the
//! search query, the descriptor file name and the legacy flag.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// The kind of artifact a crawl run looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContributionKind {
    /// Legacy `activity.json` artifacts
    Activity,

    /// Legacy `trigger.json` artifacts
    Trigger,

    /// Unified `descriptor.json` artifacts
    Contribution,
}

impl ContributionKind {
    /// File name the search query selects for this kind
    pub fn descriptor_file(&self) -> &'static str {
        match self {
            Self::Activity => "activity.json",
            Self::Trigger => "trigger.json",
            Self::Contribution => "descriptor.json",
        }
    }

    /// Activities and triggers use the older two-file format
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Activity | Self::Trigger)
    }

    /// Builds the code search query for this kind
    pub fn search_query(&self, search_term: &str) -> String {
        format!("filename:{} {}", self.descriptor_file(), search_term)
    }

    /// Converts the kind to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Activity => "ACTIVITY",
            Self::Trigger => "TRIGGER",
            Self::Contribution => "CONTRIBUTION",
        }
    }

    /// Parses a kind from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "ACTIVITY" => Some(Self::Activity),
            "TRIGGER" => Some(Self::Trigger),
            "CONTRIBUTION" => Some(Self::Contribution),
            _ => None,
        }
    }

    /// Returns all kinds
    pub fn all() -> [Self; 3] {
        [Self::Activity, Self::Trigger, Self::Contribution]
    }
}

impl fmt::Display for ContributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

impl FromStr for ContributionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "activity" => Ok(Self::Activity),
            "trigger" => Ok(Self::Trigger),
            "contribution" | "descriptor" => Ok(Self::Contribution),
            other => Err(format!(
                "unknown type '{}', expected activity, trigger or contribution",
                other
            )),
        }
    }
}

/// The canonical stored record of a discovered artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    /// Author-declared identifier, the primary key
    pub reference: String,
    pub name: String,
    pub contribution_type: ContributionKind,
    pub description: String,
    /// Hosting URL of the artifact's directory, with a trailing slash
    pub source_url: String,
    /// Owning account login
    pub author: String,
    pub uploaded_on: NaiveDate,
    pub showcase_enabled: bool,
    pub version: String,
    pub title: String,
    pub homepage: String,
    pub legacy: bool,
}
