//! HTML parser for extracting links and metadata
//!
//! This module handles parsing fetched pages to extract:
//! - Links to follow, restricted to the page's own host
//! - Page title

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Same-host links in document order, without fragments or duplicates
    pub links: Vec<String>,
}

/// Parses a fetched body
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn parse_page(body: &[u8], page_url: &Url) -> ParsedPage {
    let html = String::from_utf8_lossy(body);
    let document = Html::parse_document(&html);

    ParsedPage {
        title: title_of(&document),
        links: same_host_links(&document, page_url),
    }
}

/// Extracts the text of the first `<title>` element
///
/// Returns `None` when the document has no title or an empty one.
pub fn extract_title(html: &str) -> Option<String> {
    title_of(&Html::parse_document(html))
}

/// Extracts links that resolve to the same host and port as `base_url`
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only links
/// - Links to any other host or port
///
/// # Example
///
/// ```
/// use sitepace::crawler::extract_same_host_links;
/// use url::Url;
///
/// let html = r#"<a href="/a">A</a><a href="http://other.com/b">B</a>"#;
/// let base = Url::parse("http://example.com/").unwrap();
/// assert_eq!(extract_same_host_links(html, &base), vec!["http://example.com/a"]);
/// ```
pub fn extract_same_host_links(html: &str, base_url: &Url) -> Vec<String> {
    same_host_links(&Html::parse_document(html), base_url)
}

fn title_of(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn same_host_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let mut push = |href: &str| {
        if let Some(url) = resolve_link(href, base_url) {
            if is_same_host(&url, base_url) {
                let url = url.to_string();
                if seen.insert(url.clone()) {
                    links.push(url);
                }
            }
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute http(s) URL without fragment
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url)
}

fn is_same_host(url: &Url, base_url: &Url) -> bool {
    url.host_str() == base_url.host_str()
        && url.port_or_known_default() == base_url.port_or_known_default()
}
