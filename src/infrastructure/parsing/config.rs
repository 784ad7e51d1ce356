//! Marker table for HTML extraction
//!
//! Tag/class selectors the extractor depends on. A site markup change is
//! handled by editing these values (or the `markers` section of the config
//! file), not by runtime fallbacks.

use serde::{Deserialize, Serialize};

/// Main parsing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ParsingConfig {
    pub listing: ListingMarkers,
    pub detail: DetailMarkers,
    pub backfill: BackfillMarkers,
}

/// Selectors for listing pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingMarkers {
    /// Container holding the listing entries
    pub job_list: String,
    /// One listing entry, searched inside `job_list`
    pub job_item: String,
    /// First match supplies both title text and detail link
    pub title_link: String,
    pub company_name: String,
    pub description: String,
    pub skills: String,
    /// Tag elements inside `skills`
    pub skill_tag: String,
    pub location: String,
    /// Strip of `li` items holding experience and salary
    pub detail_strip: String,
    pub detail_strip_item: String,
    pub experience_index: usize,
    pub salary_index: usize,
}

impl Default for ListingMarkers {
    fn default() -> Self {
        Self {
            job_list: "ul.joblist".to_string(),
            job_item: "li.clearfix.joblistli".to_string(),
            title_link: "a".to_string(),
            company_name: "h3.joblist-comp-name".to_string(),
            description: "li.job-description__".to_string(),
            skills: "li.key-skills__".to_string(),
            skill_tag: "a".to_string(),
            location: "li.srp-zindex.location-tru".to_string(),
            detail_strip: "ul.top-jd-dtl".to_string(),
            detail_strip_item: "li".to_string(),
            experience_index: 1,
            salary_index: 2,
        }
    }
}

/// Selectors for detail pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailMarkers {
    pub job_id: String,
    /// Section holding the label/value pairs
    pub attribute_section: String,
    pub attribute_item: String,
    pub attribute_label: String,
    pub attribute_value: String,
    /// A nested list inside a value is flattened to comma-joined text
    pub value_list: String,
    pub value_list_item: String,
    pub employment_type: String,
}

impl Default for DetailMarkers {
    fn default() -> Self {
        Self {
            job_id: "div.jd-jobid".to_string(),
            attribute_section: "ul#applyFlowHideDetails_1".to_string(),
            attribute_item: "li.clearfix".to_string(),
            attribute_label: "label".to_string(),
            attribute_value: "span.basic-info-dtl".to_string(),
            value_list: "ul".to_string(),
            value_list_item: "li".to_string(),
            employment_type: "span.mt-4".to_string(),
        }
    }
}

/// Detail page elements used to fill absent skills and location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillMarkers {
    pub skills_container: String,
    pub skills_value: String,
    pub location_container: String,
    pub location_value: String,
}

impl Default for BackfillMarkers {
    fn default() -> Self {
        Self {
            skills_container: "div.job-skills".to_string(),
            skills_value: "span".to_string(),
            location_container: "div.location-text__.mt-8".to_string(),
            location_value: "span".to_string(),
        }
    }
}
