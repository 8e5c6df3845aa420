//! Asset URL resolution for the scripts and styles a guest document loads.
//!
//! Relative asset URLs are joined onto the base URL only when the base is
//! absolute. A relative base leaves them untouched, so the browser resolves
//! them against the guest document itself.

use regex::Regex;
use std::sync::OnceLock;

fn absolute_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:[a-z][a-z0-9+.\-]*:|//)").unwrap())
}

/// True for scheme-qualified (`https:`, `data:`, ...) and protocol-relative (`//host`) URLs.
pub fn is_absolute_url(url: &str) -> bool {
    absolute_url_re().is_match(url)
}

/// Resolve one asset URL against `base_url`.
pub fn resolve_asset_url(url: &str, base_url: &str) -> String {
    if is_absolute_url(url) || !is_absolute_url(base_url) {
        return url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

/// Resolve every list in order, dropping repeats after their first occurrence.
pub fn resolve_asset_urls<'a, I>(lists: I, base_url: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut out: Vec<String> = Vec::new();
    for list in lists {
        for url in list {
            let resolved = resolve_asset_url(url, base_url);
            if !out.contains(&resolved) {
                out.push(resolved);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_detection() {
        assert!(is_absolute_url("https://cdn.example/a.js"));
        assert!(is_absolute_url("HTTP://cdn.example/a.js"));
        assert!(is_absolute_url("//cdn.example/a.js"));
        assert!(is_absolute_url("data:text/css,body{}"));
        assert!(!is_absolute_url("a.js"));
        assert!(!is_absolute_url("/h5p/a.js"));
        assert!(!is_absolute_url("../a.js"));
        assert!(!is_absolute_url(""));
    }

    #[test]
    fn test_relative_asset_with_absolute_base() {
        assert_eq!(
            resolve_asset_url("a.js", "https://cdn.example/assets"),
            "https://cdn.example/assets/a.js"
        );
        assert_eq!(
            resolve_asset_url("/a.js", "https://cdn.example/assets/"),
            "https://cdn.example/assets/a.js"
        );
    }

    #[test]
    fn test_relative_base_leaves_assets_alone() {
        assert_eq!(resolve_asset_url("a.js", "assets"), "a.js");
        assert_eq!(resolve_asset_url("a.js", "/h5p"), "a.js");
        assert_eq!(resolve_asset_url("a.js", ""), "a.js");
    }

    #[test]
    fn test_absolute_asset_passes_through() {
        assert_eq!(
            resolve_asset_url("https://other.example/b.js", "https://cdn.example/assets"),
            "https://other.example/b.js"
        );
    }

    #[test]
    fn test_lists_are_concatenated_and_deduplicated() {
        let core = vec!["a.js".to_string(), "b.js".to_string()];
        let content = vec!["b.js".to_string(), "c.js".to_string()];
        let resolved = resolve_asset_urls(
            [core.as_slice(), content.as_slice()],
            "https://cdn.example",
        );
        assert_eq!(
            resolved,
            vec![
                "https://cdn.example/a.js",
                "https://cdn.example/b.js",
                "https://cdn.example/c.js",
            ]
        );
    }
}
