//! Detail page parser
//!
//! Folds the label/value list of a detail page into `DetailAttributes`.
//! Pairs missing either half are skipped.

use super::{
    ContextualParser, DetailContext, DetailMarkers, ParsingResult, compile_selector, element_text,
};
use crate::domain::job::DetailAttributes;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use tracing::debug;

/// Parser for detail pages
pub struct DetailParser {
    job_id: Selector,
    attribute_section: Selector,
    attribute_item: Selector,
    attribute_label: Selector,
    attribute_value: Selector,
    value_list: Selector,
    value_list_item: Selector,
    employment_type: Selector,
}

impl DetailParser {
    /// Parser with the default marker table
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&DetailMarkers::default())
    }

    pub fn with_config(markers: &DetailMarkers) -> ParsingResult<Self> {
        Ok(Self {
            job_id: compile_selector("job_id", &markers.job_id)?,
            attribute_section: compile_selector("attribute_section", &markers.attribute_section)?,
            attribute_item: compile_selector("attribute_item", &markers.attribute_item)?,
            attribute_label: compile_selector("attribute_label", &markers.attribute_label)?,
            attribute_value: compile_selector("attribute_value", &markers.attribute_value)?,
            value_list: compile_selector("value_list", &markers.value_list)?,
            value_list_item: compile_selector("value_list_item", &markers.value_list_item)?,
            employment_type: compile_selector("employment_type", &markers.employment_type)?,
        })
    }

    fn extract_pair(&self, item: ElementRef<'_>) -> Option<(String, String)> {
        let label = item
            .select(&self.attribute_label)
            .next()
            .map(|label| clean_label(&element_text(label)))
            .filter(|label| !label.is_empty())?;

        let value_span = item.select(&self.attribute_value).next()?;
        let value = if value_span.select(&self.value_list).next().is_some() {
            value_span
                .select(&self.value_list_item)
                .map(element_text)
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            element_text(value_span)
        };

        if value.is_empty() {
            None
        } else {
            Some((label, value))
        }
    }
}

/// Label text without surrounding whitespace or colons
fn clean_label(raw: &str) -> String {
    raw.trim_matches(|c: char| c == ':' || c.is_whitespace())
        .to_string()
}

impl ContextualParser for DetailParser {
    type Output = DetailAttributes;
    type Context = DetailContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> Self::Output {
        let root = html.root_element();
        let job_id = root.select(&self.job_id).next().map(element_text);

        let mut attributes = BTreeMap::new();
        if let Some(section) = root.select(&self.attribute_section).next() {
            for item in section.select(&self.attribute_item) {
                if let Some((label, value)) = self.extract_pair(item) {
                    attributes.insert(label, value);
                }
            }
        }

        let employment_type = root.select(&self.employment_type).next().map(element_text);

        debug!(
            "Parsed {} attributes from {}",
            attributes.len(),
            context.url
        );

        DetailAttributes {
            job_id,
            employment_type,
            attributes,
        }
    }
}
