//! Application layer module
//!
//! Use cases that run the scrape, clean and load stages
//! on top of the domain and infrastructure layers.

pub mod pipeline;

pub use pipeline::{CleanOutcome, JobPipeline, RunSummary, clean_records};
