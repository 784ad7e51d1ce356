//! Infrastructure layer: configuration, logging, HTTP, HTML extraction,
//! the scrape stages and storage

pub mod config;
pub mod dataset;
pub mod detail_fetch_pool;
pub mod failure_ledger;
pub mod http_client;
pub mod job_store;
pub mod link_backfill;
pub mod listing_walker;
pub mod logging;
pub mod parsing;

pub use config::{AppConfig, ConfigManager, LoggingConfig, PathsConfig, ScrapeConfig};
pub use detail_fetch_pool::DetailFetchPool;
pub use failure_ledger::{FailureEntry, FailureLedger};
pub use http_client::{FetchError, HttpClient, HttpClientConfig, PageFetcher};
pub use job_store::JobStore;
pub use link_backfill::LinkBackfill;
pub use listing_walker::{ListingWalker, PageOutcome, PageStatus, ScrapeError, ScrapeReport};
pub use logging::{LoggingGuard, init_logging_with_config, log_system_info};
pub use parsing::{DetailParser, ListingParser, ParsingConfig, ParsingError};
