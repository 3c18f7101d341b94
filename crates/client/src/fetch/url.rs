//! Request URL resolution against the controller's origin.

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a request URL the way a page would.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Absolute URLs (any scheme) are parsed as-is; everything else is joined onto `origin`
/// 3. Remove fragment (#...)
/// 4. Keep query string intact (do not reorder)
///
/// Non-http schemes are returned, not rejected: deciding whether to intercept
/// them is the controller's job.
pub fn resolve(origin: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match url::Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether the URL uses a scheme the controller can serve.
pub fn is_http(url: &url::Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        url::Url::parse("http://localhost:3000").unwrap()
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve(&origin(), "/search").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/search");
    }

    #[test]
    fn test_resolve_absolute_url() {
        let url = resolve(&origin(), "https://cdn.example.com/font.woff2").unwrap();
        assert_eq!(url.host_str(), Some("cdn.example.com"));
    }

    #[test]
    fn test_resolve_lowercase_host() {
        let url = resolve(&origin(), "https://EXAMPLE.COM").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve(&origin(), "/share#today").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/share");
    }

    #[test]
    fn test_resolve_preserve_query() {
        let url = resolve(&origin(), "/search?q=1&page=2").unwrap();
        assert_eq!(url.query(), Some("q=1&page=2"));
    }

    #[test]
    fn test_resolve_keeps_extension_scheme() {
        let url = resolve(&origin(), "chrome-extension://abcdef/content.js").unwrap();
        assert_eq!(url.scheme(), "chrome-extension");
        assert!(!is_http(&url));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_is_http() {
        assert!(is_http(&origin()));
        assert!(is_http(&url::Url::parse("https://example.com").unwrap()));
        assert!(!is_http(&url::Url::parse("data:text/plain,hi").unwrap()));
    }
}
