//! Descriptor documents
//!
//! Activity, trigger and unified contribution descriptors share the fields
//! the crawler needs. They are decoded into a loose shape first and then
//! validated into a [`Descriptor`], so a missing field is reported by name
//! instead of surfacing later as an empty column.

use crate::{CrawlError, Result};
use serde::Deserialize;

/// A validated descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Author-declared identifier
    pub reference: String,
    pub name: String,
    /// Free-form type field as written by the author
    pub descriptor_type: String,
    pub version: String,
    pub title: String,
    pub description: String,
    pub homepage: String,
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    #[serde(rename = "ref")]
    reference: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    descriptor_type: Option<String>,
    version: Option<String>,
    title: Option<String>,
    description: Option<String>,
    homepage: Option<String>,
}

impl Descriptor {
    /// Decodes and validates a descriptor body fetched from `url`
    ///
    /// `ref`, `name`, `type`, `version` and `title` must be present and
    /// non-blank. `description` and `homepage` default to empty.
    pub fn parse(url: &str, body: &str) -> Result<Self> {
        let raw: RawDescriptor = serde_json::from_str(body)
            .map_err(|e| CrawlError::protocol(url, format!("malformed descriptor: {}", e)))?;

        let required = |value: Option<String>, field: &str| -> Result<String> {
            match value {
                Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                _ => Err(CrawlError::protocol(
                    url,
                    format!("descriptor is missing `{}`", field),
                )),
            }
        };

        Ok(Self {
            reference: required(raw.reference, "ref")?,
            name: required(raw.name, "name")?,
            descriptor_type: required(raw.descriptor_type, "type")?,
            version: required(raw.version, "version")?,
            title: required(raw.title, "title")?,
            description: raw.description.unwrap_or_default(),
            homepage: raw.homepage.unwrap_or_default(),
        })
    }
}
