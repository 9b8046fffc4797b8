use crate::url::join;

/// Builds the canonical source URL of the directory holding a descriptor
///
/// `path` is the repository-relative path of the descriptor file; its final
/// segment is stripped so the URL points at the directory. The result always
/// ends with `/`.
pub fn source_url(web_base: &str, repo_full_name: &str, path: &str) -> String {
    let directory = match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "",
    };

    join(
        web_base,
        &format!("{}/tree/master/{}", repo_full_name, directory),
    )
}

/// Reconstructs the source URL an artifact `ref` is expected to live at
///
/// The ref is read as `{host}/{owner}/{repo}` followed by a path suffix and
/// re-assembled as `https://{host}/{owner}/{repo}/tree/master/{suffix}/`.
///
/// # Returns
///
/// * `Some(String)` - The expected URL
/// * `None` - The ref has fewer than three path segments
///
/// # Examples
///
/// ```
/// use contrib_crawler::url::expected_source_url;
///
/// assert_eq!(
///     expected_source_url("github.com/acme/widgets/extras/foo").as_deref(),
///     Some("https://github.com/acme/widgets/tree/master/extras/foo/")
/// );
/// assert_eq!(expected_source_url("widgets/foo"), None);
/// ```
pub fn expected_source_url(reference: &str) -> Option<String> {
    let segments: Vec<&str> = reference.split('/').collect();
    if segments.len() < 3 {
        return None;
    }

    Some(format!(
        "https://{}/tree/master/{}/",
        segments[..3].join("/"),
        segments[3..].join("/")
    ))
}

/// Decides whether a candidate's source URL belongs to the lineage of `reference`
///
/// True when the candidate URL is a non-empty substring of the URL derived
/// from the ref. Forks live under a different owner or repository name and
/// fail this check.
pub fn is_same_lineage(reference: &str, candidate_source_url: &str) -> bool {
    if candidate_source_url.is_empty() {
        return false;
    }

    match expected_source_url(reference) {
        Some(expected) => expected.contains(candidate_source_url),
        None => false,
    }
}
