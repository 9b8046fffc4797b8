//! `Link` header parsing
//!
//! GitHub paginates with RFC 8288 link relations:
//!
//! ```text
//! <https://api.github.com/search/code?q=x&page=2>; rel="next", <https://api.github.com/search/code?q=x&page=34>; rel="last"
//! ```

use url::Url;

/// Extracts the `page` query parameter of the `rel="last"` link
///
/// Returns `None` when the header has no `last` relation or its URL carries no
/// numeric `page` parameter.
pub fn last_page(header: &str) -> Option<u32> {
    header
        .split(',')
        .filter_map(parse_link)
        .find(|(_, rels)| rels.iter().any(|r| r == "last"))
        .and_then(|(target, _)| page_param(&target))
}

/// Splits one `<url>; rel="a b"` entry into its target and relation types
fn parse_link(entry: &str) -> Option<(String, Vec<String>)> {
    let mut parts = entry.split(';');
    let target = parts
        .next()?
        .trim()
        .strip_prefix('<')?
        .strip_suffix('>')?
        .to_string();

    let rels = parts
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            if key.trim().eq_ignore_ascii_case("rel") {
                Some(value.trim().trim_matches('"').to_string())
            } else {
                None
            }
        })
        .flat_map(|value| {
            value
                .split_whitespace()
                .map(|r| r.to_ascii_lowercase())
                .collect::<Vec<_>>()
        })
        .collect();

    Some((target, rels))
}

fn page_param(target: &str) -> Option<u32> {
    let url = Url::parse(target).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_style_header() {
        let header = r#"<https://api.github.com/search/code?q=filename%3Aactivity.json+flogo&page=2>; rel="next", <https://api.github.com/search/code?q=filename%3Aactivity.json+flogo&page=34>; rel="last""#;
        assert_eq!(last_page(header), Some(34));
    }

    #[test]
    fn test_page_not_last_parameter() {
        let header = r#"<https://api.github.com/search/code?page=7&q=x&sort=indexed>; rel="last""#;
        assert_eq!(last_page(header), Some(7));
    }

    #[test]
    fn test_no_last_relation() {
        let header = r#"<https://api.github.com/search/code?q=x&page=1>; rel="prev", <https://api.github.com/search/code?q=x&page=1>; rel="first""#;
        assert_eq!(last_page(header), None);
    }

    #[test]
    fn test_multiple_relation_types() {
        let header = r#"<https://example.com/x?page=3>; rel="next last""#;
        assert_eq!(last_page(header), Some(3));
    }

    #[test]
    fn test_garbage_header() {
        assert_eq!(last_page(""), None);
        assert_eq!(last_page("not a link header"), None);
        assert_eq!(last_page(r#"<https://example.com/x?page=abc>; rel="last""#), None);
    }
}
