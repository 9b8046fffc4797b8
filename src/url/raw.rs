use crate::url::join;

/// Derives the raw-content URL of a file from its web UI URL
///
/// The web host is replaced with the raw-content host and the `blob` path
/// segment following `{owner}/{repo}` is dropped:
///
/// ```text
/// https://github.com/acme/widgets/blob/master/extras/foo/activity.json
/// https://raw.githubusercontent.com/acme/widgets/master/extras/foo/activity.json
/// ```
///
/// # Returns
///
/// * `Some(String)` - The raw-content URL
/// * `None` - The URL is not under `web_base` or is not a blob URL
///
/// # Examples
///
/// ```
/// use contrib_crawler::url::raw_content_url;
///
/// let raw = raw_content_url(
///     "https://github.com/acme/widgets/blob/master/activity.json",
///     "https://github.com",
///     "https://raw.githubusercontent.com",
/// );
/// assert_eq!(
///     raw.as_deref(),
///     Some("https://raw.githubusercontent.com/acme/widgets/master/activity.json")
/// );
/// ```
pub fn raw_content_url(html_url: &str, web_base: &str, raw_base: &str) -> Option<String> {
    let path = html_url.strip_prefix(web_base.trim_end_matches('/'))?;
    if !path.starts_with('/') {
        return None;
    }

    let mut segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    // owner / repo / blob / git-ref / file...
    if segments.len() < 5 || segments[2] != "blob" {
        return None;
    }
    segments.remove(2);

    Some(join(raw_base, &segments.join("/")))
}
