//! Read-only structural queries over rendered HTML
//!
//! Thin helpers over `scraper` element references: selecting descendants,
//! walking element children and reading trimmed text. Selectors are compiled
//! on use, and a malformed selector surfaces as [`InvalidSelector`] instead of
//! a panic.

use scraper::{ElementRef, Selector};
use thiserror::Error;
use url::Url;

/// A CSS selector that failed to compile
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector `{0}`")]
pub struct InvalidSelector(pub String);

/// Compiles a CSS selector
pub fn css(query: &str) -> Result<Selector, InvalidSelector> {
    Selector::parse(query).map_err(|_| InvalidSelector(query.to_string()))
}

/// Returns all descendants of `scope` matching `query`, in document order
pub fn select_all<'a>(scope: ElementRef<'a>, query: &str) -> Result<Vec<ElementRef<'a>>, InvalidSelector> {
    let selector = css(query)?;
    Ok(scope.select(&selector).collect())
}

/// Returns the first descendant of `scope` matching `query`
pub fn select_first<'a>(
    scope: ElementRef<'a>,
    query: &str,
) -> Result<Option<ElementRef<'a>>, InvalidSelector> {
    let selector = css(query)?;
    Ok(scope.select(&selector).next())
}

/// Returns the element children of `element`, skipping text and comment nodes
pub fn children(element: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap).collect()
}

/// Returns the direct children of `element` with the given tag name
pub fn children_named<'a>(element: ElementRef<'a>, tag: &str) -> Vec<ElementRef<'a>> {
    children(element)
        .into_iter()
        .filter(|child| child.value().name() == tag)
        .collect()
}

/// Concatenated text content of `element`, untrimmed
pub fn raw_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Concatenated text content of `element`, trimmed
pub fn text(element: ElementRef<'_>) -> String {
    raw_text(element).trim().to_string()
}

/// Trimmed text of the first descendant matching `query`, or an empty string
pub fn first_text(scope: ElementRef<'_>, query: &str) -> Result<String, InvalidSelector> {
    Ok(select_first(scope, query)?.map(text).unwrap_or_default())
}

/// Returns the `n`th item counting from the end (`0` is the last item)
pub fn nth_from_end<T>(items: &[T], n: usize) -> Option<&T> {
    items.len().checked_sub(n + 1).and_then(|index| items.get(index))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_href(href: &str, base_url: &Url) -> Option<String> {
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

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
