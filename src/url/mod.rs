//! URL handling module
//!
//! Everything the crawler derives from URLs lives here: the raw-content
//! location of a descriptor, the canonical source URL of an artifact
//! directory, and the source URL a `ref` is expected to live at.

mod identity;
mod raw;

pub use identity::{expected_source_url, is_same_lineage, source_url};
pub use raw::raw_content_url;

/// Joins a base URL and a path without doubling or dropping the separator
pub(crate) fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
