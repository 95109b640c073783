use crate::UrlError;
use url::Url;

/// Query parameters that select a different document and therefore survive
/// normalization. Everything else (tracking, display toggles) is stripped.
const RELEVANT_PARAMS: &[&str] = &["curid", "from", "pagefrom", "pageuntil", "title"];

/// Normalizes a URL into the form used as its visited-set key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP(S)
/// 3. Lowercase the host (the `url` crate does this on parse)
/// 4. Normalize path:
///    - Remove dot segments (. and ..) and repeated slashes
///    - Remove trailing slash (except for root /)
///    - Uppercase percent-escape hex digits
///    - Empty path becomes /
/// 5. Remove fragment (everything after #)
/// 6. Keep only document-selecting query parameters, sorted by key
/// 7. Remove empty query string (trailing ?)
///
/// # Examples
///
/// ```
/// use bio_harvest::url::normalize_url;
///
/// let url = normalize_url("https://PT.wikipedia.org/wiki/Pel%c3%a9/?utm_source=x#Carreira").unwrap();
/// assert_eq!(url.as_str(), "https://pt.wikipedia.org/wiki/Pel%C3%A9");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let kept = relevant_query_params(&url);

        if kept.is_empty() {
            url.set_query(None);
        } else {
            let mut serializer = url::form_urlencoded::Serializer::new(String::new());
            for (key, value) in &kept {
                serializer.append_pair(key, value);
            }
            let query = serializer.finish();
            url.set_query(Some(&query));
        }
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    uppercase_escapes(&format!("/{}", segments.join("/")))
}

/// Uppercases the two hex digits following every `%` so that `%c3%a9` and
/// `%C3%A9` produce the same key
fn uppercase_escapes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut pending_hex = 0u8;

    for c in path.chars() {
        if pending_hex > 0 {
            out.push(c.to_ascii_uppercase());
            pending_hex -= 1;
        } else {
            if c == '%' {
                pending_hex = 2;
            }
            out.push(c);
        }
    }

    out
}

/// Keeps only document-selecting parameters, sorted by key
fn relevant_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| RELEVANT_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort();

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_preserved() {
        let result = normalize_url("http://example.com/page").unwrap();
        assert_eq!(result.as_str(), "http://example.com/page");
    }

    #[test]
    fn test_remove_trailing_slash() {
        let result = normalize_url("https://example.com/wiki/Pele/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/wiki/Pele");
    }

    #[test]
    fn test_keep_root_slash() {
        let result = normalize_url("https://example.com/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/wiki/Zico#Carreira").unwrap();
        assert_eq!(result.as_str(), "https://example.com/wiki/Zico");
    }

    #[test]
    fn test_strip_irrelevant_query() {
        let result =
            normalize_url("https://example.com/wiki/Zico?utm_source=x&action=render").unwrap();
        assert_eq!(result.as_str(), "https://example.com/wiki/Zico");
    }

    #[test]
    fn test_keep_category_pagination() {
        let result = normalize_url(
            "https://example.com/wiki/Categoria:Brasileiros?utm_medium=a&pagefrom=Silva",
        )
        .unwrap();
        assert_eq!(
            result.as_str(),
            "https://example.com/wiki/Categoria:Brasileiros?pagefrom=Silva"
        );
    }

    #[test]
    fn test_sort_relevant_params() {
        let result = normalize_url("https://example.com/w/index.php?title=Zico&curid=7").unwrap();
        assert_eq!(
            result.as_str(),
            "https://example.com/w/index.php?curid=7&title=Zico"
        );
    }

    #[test]
    fn test_normalize_path_with_dots() {
        let result = normalize_url("https://example.com/a/../wiki/./Zico").unwrap();
        assert_eq!(result.as_str(), "https://example.com/wiki/Zico");
    }

    #[test]
    fn test_lowercase_host_keeps_path_case() {
        let result = normalize_url("https://EXAMPLE.COM/wiki/Machado_de_Assis").unwrap();
        assert_eq!(result.as_str(), "https://example.com/wiki/Machado_de_Assis");
    }

    #[test]
    fn test_escape_case_is_canonical() {
        let lower = normalize_url("https://example.com/wiki/Pel%c3%a9").unwrap();
        let upper = normalize_url("https://example.com/wiki/Pel%C3%A9").unwrap();
        let raw = normalize_url("https://example.com/wiki/Pelé").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(upper, raw);
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_url("not a url").is_err());
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_multiple_slashes() {
        let result = normalize_url("https://example.com///wiki//Zico").unwrap();
        assert_eq!(result.as_str(), "https://example.com/wiki/Zico");
    }
}
