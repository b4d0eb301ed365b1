use crate::html::HtmlError;
use scraper::{ElementRef, Html, Selector};

/// Pseudo-attribute selecting an element's text content
pub const TEXT: &str = "text";

fn parse_selector(selector: &str) -> Result<Selector, HtmlError> {
    Selector::parse(selector).map_err(|e| HtmlError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

fn read(element: ElementRef<'_>, attribute: &str) -> Option<String> {
    if attribute == TEXT {
        Some(element.text().collect())
    } else {
        element.value().attr(attribute).map(str::to_string)
    }
}

/// Reads `attribute` of the first element matching `selector`
///
/// Returns `default` when nothing matches or the element lacks the attribute.
pub fn select_one(
    document: &Html,
    selector: &str,
    attribute: &str,
    default: Option<&str>,
) -> Result<Option<String>, HtmlError> {
    let selector = parse_selector(selector)?;
    let value = document
        .select(&selector)
        .next()
        .and_then(|element| read(element, attribute));
    Ok(value.or_else(|| default.map(str::to_string)))
}

/// Text of the first element matching `selector`, empty if none matches
pub fn select_text_one(document: &Html, selector: &str) -> Result<String, HtmlError> {
    Ok(select_one(document, selector, TEXT, Some(""))?.unwrap_or_default())
}

/// Reads `attribute` of every matching element, skipping elements without it
pub fn select_all(
    document: &Html,
    selector: &str,
    attribute: &str,
) -> Result<Vec<String>, HtmlError> {
    let selector = parse_selector(selector)?;
    Ok(document
        .select(&selector)
        .filter_map(|element| read(element, attribute))
        .collect())
}
