//! Parsing context for HTML extraction

/// Context for one listing page
#[derive(Debug, Clone)]
pub struct ListingContext {
    /// 1-based page number
    pub page_number: u32,

    /// URL the page was fetched from; relative links resolve against it
    pub page_url: String,
}

impl ListingContext {
    pub fn new(page_number: u32, page_url: impl Into<String>) -> Self {
        Self {
            page_number,
            page_url: page_url.into(),
        }
    }
}

/// Context for one detail page
#[derive(Debug, Clone)]
pub struct DetailContext {
    pub url: String,
}

impl DetailContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}
