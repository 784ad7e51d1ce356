//! job-harvester - job posting scraping and normalization pipeline
//!
//! Walks a paginated job listing, enriches every posting with the attributes
//! of its detail page, normalizes the combined records into a fixed schema
//! and loads them into SQLite.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub mod test_utils;
