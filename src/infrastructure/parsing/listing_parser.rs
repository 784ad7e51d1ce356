//! Listing page parser
//!
//! One `RawListingRecord` per matched listing entry, in document order.

use super::{
    ContextualParser, ListingContext, ListingMarkers, ParsingResult, compile_selector, first_text,
    resolve_link,
};
use crate::domain::job::RawListingRecord;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Parser for listing pages
pub struct ListingParser {
    job_list: Selector,
    job_item: Selector,
    title_link: Selector,
    company_name: Selector,
    description: Selector,
    skills: Selector,
    skill_tag: Selector,
    location: Selector,
    detail_strip: Selector,
    detail_strip_item: Selector,
    experience_index: usize,
    salary_index: usize,
}

impl ListingParser {
    /// Parser with the default marker table
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ListingMarkers::default())
    }

    pub fn with_config(markers: &ListingMarkers) -> ParsingResult<Self> {
        Ok(Self {
            job_list: compile_selector("job_list", &markers.job_list)?,
            job_item: compile_selector("job_item", &markers.job_item)?,
            title_link: compile_selector("title_link", &markers.title_link)?,
            company_name: compile_selector("company_name", &markers.company_name)?,
            description: compile_selector("description", &markers.description)?,
            skills: compile_selector("skills", &markers.skills)?,
            skill_tag: compile_selector("skill_tag", &markers.skill_tag)?,
            location: compile_selector("location", &markers.location)?,
            detail_strip: compile_selector("detail_strip", &markers.detail_strip)?,
            detail_strip_item: compile_selector("detail_strip_item", &markers.detail_strip_item)?,
            experience_index: markers.experience_index,
            salary_index: markers.salary_index,
        })
    }

    fn extract_record(&self, job: ElementRef<'_>, context: &ListingContext) -> RawListingRecord {
        let anchor = job.select(&self.title_link).next();
        let title = anchor.map(super::element_text).unwrap_or_default();
        let link = anchor
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(|href| Self::absolute_link(href, context));

        let company_name = job
            .select(&self.company_name)
            .next()
            .map(super::element_text);

        let skills = job
            .select(&self.skills)
            .next()
            .map(|container| {
                container
                    .select(&self.skill_tag)
                    .map(super::element_text)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();

        let (experience, salary) = match job.select(&self.detail_strip).next() {
            Some(strip) => {
                let items: Vec<String> = strip
                    .select(&self.detail_strip_item)
                    .map(super::element_text)
                    .collect();
                (
                    items.get(self.experience_index).cloned().unwrap_or_default(),
                    items.get(self.salary_index).cloned().unwrap_or_default(),
                )
            }
            None => (String::new(), String::new()),
        };

        RawListingRecord {
            title,
            link,
            company_name,
            job_description: first_text(job, &self.description),
            skills,
            location: first_text(job, &self.location),
            experience,
            salary,
        }
    }

    fn absolute_link(href: &str, context: &ListingContext) -> String {
        match resolve_link(&context.page_url, href) {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!("Keeping link verbatim on page {}: {}", context.page_number, e);
                href.to_string()
            }
        }
    }
}

impl ContextualParser for ListingParser {
    type Output = Vec<RawListingRecord>;
    type Context = ListingContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> Self::Output {
        let records: Vec<RawListingRecord> = html
            .select(&self.job_list)
            .flat_map(|list| list.select(&self.job_item))
            .map(|job| self.extract_record(job, context))
            .collect();

        debug!(
            "Extracted {} listing records from page {}",
            records.len(),
            context.page_number
        );
        records
    }
}
