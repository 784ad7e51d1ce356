//! Job pipeline use cases
//!
//! scrape: walk listing pages and persist the enriched record set
//! clean: normalize, backfill, infer roles, convert to canonical records
//! load: hand canonical records to the job store

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::job::{CanonicalRecord, EnrichedRecord, JobRow};
use crate::domain::normalizer::FieldNormalizer;
use crate::domain::role::infer_roles;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::dataset::{read_jsonl, write_jsonl};
use crate::infrastructure::detail_fetch_pool::DetailFetchPool;
use crate::infrastructure::failure_ledger::FailureLedger;
use crate::infrastructure::http_client::PageFetcher;
use crate::infrastructure::job_store::JobStore;
use crate::infrastructure::link_backfill::LinkBackfill;
use crate::infrastructure::listing_walker::{ListingWalker, ScrapeReport};
use crate::infrastructure::parsing::{DetailParser, ListingParser};

/// Result of the cleaning stage
#[derive(Debug, Clone, Default)]
pub struct CleanOutcome {
    pub records: Vec<CanonicalRecord>,
    pub rows_in: usize,
    /// Rows removed by the normalizer (no usable job identifier)
    pub rows_dropped: usize,
    pub roles_inferred: usize,
    pub values_backfilled: usize,
    /// Rows that failed canonical conversion
    pub rows_rejected: usize,
}

/// Summary of a full run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub scraped: usize,
    pub failed_pages: usize,
    pub failed_details: usize,
    pub cleaned: usize,
    pub inserted: u64,
}

/// Flatten and normalize a record set
pub fn normalize_records(
    normalizer: &FieldNormalizer,
    records: Vec<EnrichedRecord>,
) -> Vec<JobRow> {
    let rows = records.into_iter().map(EnrichedRecord::into_row).collect();
    normalizer.normalize(rows)
}

/// Infer missing roles and convert to canonical records
pub fn finalize_rows(mut rows: Vec<JobRow>, outcome: &mut CleanOutcome) {
    outcome.roles_inferred = infer_roles(&mut rows);

    for row in rows {
        match CanonicalRecord::try_from(row) {
            Ok(record) => outcome.records.push(record),
            Err(e) => {
                warn!("Rejecting row: {}", e);
                outcome.rows_rejected += 1;
            }
        }
    }
}

/// Clean a record set without network access
pub fn clean_records(normalizer: &FieldNormalizer, records: Vec<EnrichedRecord>) -> CleanOutcome {
    let mut outcome = CleanOutcome {
        rows_in: records.len(),
        ..CleanOutcome::default()
    };
    let rows = normalize_records(normalizer, records);
    outcome.rows_dropped = outcome.rows_in - rows.len();
    finalize_rows(rows, &mut outcome);
    outcome
}

pub struct JobPipeline {
    config: AppConfig,
    fetcher: Arc<dyn PageFetcher>,
    normalizer: FieldNormalizer,
}

impl JobPipeline {
    pub fn new(config: AppConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config,
            fetcher,
            normalizer: FieldNormalizer::standard(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Walk the configured listing pages
    pub async fn scrape(&self) -> Result<ScrapeReport> {
        let scrape = &self.config.scrape;
        let ledger = Arc::new(FailureLedger::open(&self.config.paths.failure_ledger).await?);

        let pool = DetailFetchPool::new(
            Arc::clone(&self.fetcher),
            Arc::new(DetailParser::with_config(&scrape.markers.detail)?),
            ledger,
            scrape.detail_max_concurrent,
        );
        let walker = ListingWalker::new(
            Arc::clone(&self.fetcher),
            ListingParser::with_config(&scrape.markers.listing)?,
            pool,
            scrape.url_template.clone(),
        )?;

        Ok(walker.walk(scrape.max_pages).await?)
    }

    /// Scrape and write the raw dataset
    pub async fn scrape_to_dataset(&self) -> Result<ScrapeReport> {
        let report = self.scrape().await?;
        write_jsonl(&self.config.paths.raw_dataset, &report.records).await?;
        Ok(report)
    }

    /// Normalize, backfill, infer roles and convert
    pub async fn clean(&self, records: Vec<EnrichedRecord>) -> Result<CleanOutcome> {
        info!("Starting data cleaning process");
        let mut outcome = CleanOutcome {
            rows_in: records.len(),
            ..CleanOutcome::default()
        };

        let mut rows = normalize_records(&self.normalizer, records);
        outcome.rows_dropped = outcome.rows_in - rows.len();

        if self.config.scrape.backfill_missing {
            let backfill = LinkBackfill::new(
                Arc::clone(&self.fetcher),
                &self.config.scrape.markers.backfill,
                self.config.scrape.detail_max_concurrent,
            )?;
            outcome.values_backfilled = backfill.backfill(&mut rows).await;
        }

        finalize_rows(rows, &mut outcome);
        info!(
            "Cleaning complete: {} in, {} dropped, {} rejected, {} kept",
            outcome.rows_in,
            outcome.rows_dropped,
            outcome.rows_rejected,
            outcome.records.len()
        );
        Ok(outcome)
    }

    /// Raw dataset to cleaned dataset. An empty raw dataset writes nothing.
    pub async fn clean_dataset(&self) -> Result<CleanOutcome> {
        let records: Vec<EnrichedRecord> = read_jsonl(&self.config.paths.raw_dataset).await?;
        if records.is_empty() {
            info!("No data to clean");
            return Ok(CleanOutcome::default());
        }

        let outcome = self.clean(records).await?;
        write_jsonl(&self.config.paths.cleaned_dataset, &outcome.records).await?;
        Ok(outcome)
    }

    /// Cleaned dataset into the job store
    pub async fn load_dataset(&self) -> Result<u64> {
        let records: Vec<CanonicalRecord> =
            read_jsonl(&self.config.paths.cleaned_dataset).await?;
        self.store(&records).await
    }

    async fn store(&self, records: &[CanonicalRecord]) -> Result<u64> {
        let store = JobStore::connect(&self.config.paths.database_url)
            .await
            .context("Failed to open job store")?;
        store.create_schema().await?;
        store.insert_records(records).await
    }

    /// Every stage, persisting each intermediate dataset
    pub async fn run(&self) -> Result<RunSummary> {
        let report = self.scrape_to_dataset().await?;
        let scraped = report.records.len();
        let failed_pages = report.pages_failed();
        let failed_details = report.detail_failures();

        let outcome = self.clean(report.records).await?;
        write_jsonl(&self.config.paths.cleaned_dataset, &outcome.records).await?;

        let inserted = self.store(&outcome.records).await?;

        Ok(RunSummary {
            scraped,
            failed_pages,
            failed_details,
            cleaned: outcome.records.len(),
            inserted,
        })
    }
}
