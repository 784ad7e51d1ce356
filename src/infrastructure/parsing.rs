//! HTML record extraction
//!
//! Pure parsing of listing and detail pages into domain records. No network
//! I/O happens here and malformed-but-parseable markup never fails a page.

pub mod config;
pub mod context;
pub mod detail_parser;
pub mod error;
pub mod listing_parser;

pub use config::{BackfillMarkers, DetailMarkers, ListingMarkers, ParsingConfig};
pub use context::{DetailContext, ListingContext};
pub use detail_parser::DetailParser;
pub use error::{ParsingError, ParsingResult};
pub use listing_parser::ListingParser;

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Parser trait with context support
pub trait ContextualParser {
    type Output;
    type Context;

    /// Parse a document with contextual information
    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> Self::Output;

    /// Parse raw markup. The `Html` tree is dropped before returning.
    fn parse_str(&self, markup: &str, context: &Self::Context) -> Self::Output {
        let document = Html::parse_document(markup);
        self.parse_with_context(&document, context)
    }
}

pub(crate) fn compile_selector(marker: &str, selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| ParsingError::invalid_selector(marker, selector, &e.to_string()))
}

/// Concatenated descendant text, trimmed
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first descendant matching `selector`, empty when absent
pub(crate) fn first_text(element: ElementRef<'_>, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

/// Resolve `href` against the page it was found on
pub fn resolve_link(base_url: &str, href: &str) -> ParsingResult<String> {
    let base = Url::parse(base_url)
        .map_err(|e| ParsingError::url_resolution_failed(href, &e.to_string(), Some(base_url)))?;
    base.join(href)
        .map(String::from)
        .map_err(|e| ParsingError::url_resolution_failed(href, &e.to_string(), Some(base_url)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_link() {
        let resolved = resolve_link("https://jobs.example.com/list?page=2", "/job/42").unwrap();
        assert_eq!(resolved, "https://jobs.example.com/job/42");
    }

    #[test]
    fn test_resolve_absolute_link_unchanged() {
        let resolved =
            resolve_link("https://jobs.example.com/list", "https://other.example.org/x").unwrap();
        assert_eq!(resolved, "https://other.example.org/x");
    }

    #[test]
    fn test_resolve_against_bad_base_fails() {
        assert!(matches!(
            resolve_link("not a url", "/job/42"),
            Err(ParsingError::UrlResolutionFailed { .. })
        ));
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let err = compile_selector("job_list", "ul..joblist").unwrap_err();
        assert!(matches!(
            err,
            ParsingError::InvalidSelector { ref marker, .. } if marker == "job_list"
        ));
    }
}
