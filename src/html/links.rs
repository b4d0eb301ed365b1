use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts followable links from an HTML page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links
/// - Anything that does not resolve to an http(s) URL
///
/// Fragments are stripped and duplicates removed, keeping first-seen order.
///
/// # Example
///
/// ```
/// use sumi_swarm::html::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/page#top">Link</a><a href="/page">Again</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/page");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for href in hrefs(&document) {
        if let Some(url) = resolve_link(href, base_url) {
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }
    }

    links
}

/// Raw `href` values of followable elements, in document order
fn hrefs(document: &Html) -> Vec<&str> {
    let mut hrefs = Vec::new();

    if let Ok(anchor) = Selector::parse("a[href]") {
        hrefs.extend(
            document
                .select(&anchor)
                .filter(|element| element.value().attr("download").is_none())
                .filter_map(|element| element.value().attr("href")),
        );
    }

    if let Ok(canonical) = Selector::parse("link[rel='canonical'][href]") {
        hrefs.extend(
            document
                .select(&canonical)
                .filter_map(|element| element.value().attr("href")),
        );
    }

    hrefs
}

/// Resolves a link href to an absolute http(s) URL without fragment
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| href.starts_with(scheme))
    {
        return None;
    }

    let mut url = base_url.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}
