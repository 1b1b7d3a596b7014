use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the routing key for a URL
///
/// The key is the lowercase host with a leading `www.` removed, so
/// `http://WWW.Example.com/a` and `https://example.com/b` land in the same
/// frontier. Ports are not part of the key.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitepace::domain::host_key;
///
/// let url = Url::parse("https://www.example.com/path").unwrap();
/// assert_eq!(host_key(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("https://blog.example.com/post").unwrap();
/// assert_eq!(host_key(&url), Some("blog.example.com".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => Some(rest.to_string()),
        _ => Some(host),
    }
}

/// Parses a string into an absolute http(s) URL that has a host
pub fn parse_http_url(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Parses a raw URL string and returns its routing key
pub fn host_key_of(raw: &str) -> UrlResult<String> {
    let url = parse_http_url(raw)?;
    host_key(&url).ok_or(UrlError::MissingDomain)
}
