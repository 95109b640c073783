use url::Url;

/// Returns the origin of a URL as `scheme://host[:port]`
///
/// Two URLs belong to the same site when their origins are equal. The origin
/// is also the key under which robots.txt is cached.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use bio_harvest::url::site_of;
///
/// let url = Url::parse("https://pt.wikipedia.org/wiki/Zico").unwrap();
/// assert_eq!(site_of(&url), Some("https://pt.wikipedia.org".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/wiki/Zico").unwrap();
/// assert_eq!(site_of(&url), Some("http://127.0.0.1:8080".to_string()));
/// ```
pub fn site_of(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}://{}:{}", url.scheme(), host, port)),
        None => Some(format!("{}://{}", url.scheme(), host)),
    }
}

/// Returns true when both URLs share scheme, host and port
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (site_of(a), site_of(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Extracts the decoded page name that follows `prefix` in the URL path
///
/// `https://pt.wikipedia.org/wiki/Pel%C3%A9` with prefix `/wiki/` yields
/// `Pelé`. Returns None when the path does not start with the prefix or the
/// remainder is empty.
pub fn page_slug(url: &Url, prefix: &str) -> Option<String> {
    let rest = url.path().strip_prefix(prefix)?;
    if rest.is_empty() {
        return None;
    }

    let decoded = urlencoding::decode(rest)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| rest.to_string());

    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_without_port() {
        let url = Url::parse("https://EXAMPLE.com/wiki/Zico").unwrap();
        assert_eq!(site_of(&url), Some("https://example.com".to_string()));
    }

    #[test]
    fn test_site_with_port() {
        let url = Url::parse("http://127.0.0.1:4321/").unwrap();
        assert_eq!(site_of(&url), Some("http://127.0.0.1:4321".to_string()));
    }

    #[test]
    fn test_same_site_ignores_path_and_query() {
        let a = Url::parse("https://example.com/wiki/A?x=1").unwrap();
        let b = Url::parse("https://example.com/wiki/B").unwrap();
        assert!(same_site(&a, &b));
    }

    #[test]
    fn test_different_port_is_different_site() {
        let a = Url::parse("http://127.0.0.1:4321/").unwrap();
        let b = Url::parse("http://127.0.0.1:4322/").unwrap();
        assert!(!same_site(&a, &b));
    }

    #[test]
    fn test_different_scheme_is_different_site() {
        let a = Url::parse("http://example.com/").unwrap();
        let b = Url::parse("https://example.com/").unwrap();
        assert!(!same_site(&a, &b));
    }

    #[test]
    fn test_page_slug_decodes() {
        let url = Url::parse("https://example.com/wiki/Pel%C3%A9").unwrap();
        assert_eq!(page_slug(&url, "/wiki/"), Some("Pelé".to_string()));
    }

    #[test]
    fn test_page_slug_wrong_prefix() {
        let url = Url::parse("https://example.com/w/index.php").unwrap();
        assert_eq!(page_slug(&url, "/wiki/"), None);
    }

    #[test]
    fn test_page_slug_empty_remainder() {
        let url = Url::parse("https://example.com/wiki/").unwrap();
        assert_eq!(page_slug(&url, "/wiki/"), None);
    }
}
