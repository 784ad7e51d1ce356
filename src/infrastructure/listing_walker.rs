//! Listing walker
//!
//! Walks pages `1..=max_pages` in order. For each page: fetch, extract the
//! listing records, fetch their detail pages through the pool, then append
//! the index-aligned `EnrichedRecord`s. A page that fails or yields nothing
//! is skipped. A run is an error only when no page yields a listing entry:
//! `SourceUnreachable` if every fetch failed, `SourceUnparseable` otherwise.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::domain::job::EnrichedRecord;
use crate::infrastructure::config::defaults::PAGE_PLACEHOLDER;
use crate::infrastructure::detail_fetch_pool::DetailFetchPool;
use crate::infrastructure::http_client::PageFetcher;
use crate::infrastructure::parsing::{ContextualParser, ListingContext, ListingParser};

/// Run-level failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    #[error("URL template '{template}' has no {{page}} placeholder")]
    InvalidUrlTemplate { template: String },

    #[error("Source unreachable: all {pages} listing pages failed (last error: {last_error})")]
    SourceUnreachable { pages: u32, last_error: String },

    /// Pages were fetched but none held a listing entry, usually a stale marker table
    #[error("Source unparseable: no listing records on any of {pages} pages ({empty} empty)")]
    SourceUnparseable { pages: u32, empty: usize },
}

/// What happened to one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Scraped { records: usize, detail_failures: usize },
    Empty,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub page: u32,
    pub url: String,
    pub status: PageStatus,
}

/// Result of one walk
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages: Vec<PageOutcome>,
    pub records: Vec<EnrichedRecord>,
}

impl ScrapeReport {
    pub fn pages_failed(&self) -> usize {
        self.count(|status| matches!(status, PageStatus::Failed { .. }))
    }

    pub fn pages_empty(&self) -> usize {
        self.count(|status| matches!(status, PageStatus::Empty))
    }

    pub fn detail_failures(&self) -> usize {
        self.pages
            .iter()
            .map(|outcome| match outcome.status {
                PageStatus::Scraped {
                    detail_failures, ..
                } => detail_failures,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, predicate: impl Fn(&PageStatus) -> bool) -> usize {
        self.pages.iter().filter(|o| predicate(&o.status)).count()
    }
}

pub struct ListingWalker {
    fetcher: Arc<dyn PageFetcher>,
    parser: ListingParser,
    pool: DetailFetchPool,
    url_template: String,
}

impl ListingWalker {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        parser: ListingParser,
        pool: DetailFetchPool,
        url_template: impl Into<String>,
    ) -> Result<Self, ScrapeError> {
        let url_template = url_template.into();
        if !url_template.contains(PAGE_PLACEHOLDER) {
            return Err(ScrapeError::InvalidUrlTemplate {
                template: url_template,
            });
        }

        Ok(Self {
            fetcher,
            parser,
            pool,
            url_template,
        })
    }

    pub fn page_url(&self, page: u32) -> String {
        self.url_template
            .replace(PAGE_PLACEHOLDER, &page.to_string())
    }

    /// Walk exactly `max_pages` pages. Zero pages is an empty, successful run.
    pub async fn walk(&self, max_pages: u32) -> Result<ScrapeReport, ScrapeError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("scrape_run", %run_id);
        self.walk_pages(run_id, max_pages).instrument(span).await
    }

    async fn walk_pages(&self, run_id: Uuid, max_pages: u32) -> Result<ScrapeReport, ScrapeError> {
        let started_at = Utc::now();
        info!("Starting scrape of {} pages", max_pages);

        let mut pages = Vec::with_capacity(max_pages as usize);
        let mut records = Vec::new();
        let mut last_error = None;

        for page in 1..=max_pages {
            let url = self.page_url(page);
            info!("Processing page {} from URL: {}", page, url);

            let status = match self.fetcher.fetch_page(&url).await {
                Ok(markup) => {
                    let page_records = self.scrape_page(page, &url, &markup).await;
                    let status = match &page_records {
                        Some((scraped, detail_failures)) => PageStatus::Scraped {
                            records: scraped.len(),
                            detail_failures: *detail_failures,
                        },
                        None => PageStatus::Empty,
                    };
                    if let Some((scraped, _)) = page_records {
                        records.extend(scraped);
                    }
                    status
                }
                Err(e) => {
                    error!("Request error on page {}: {}", page, e);
                    let reason = e.to_string();
                    last_error = Some(reason.clone());
                    PageStatus::Failed { reason }
                }
            };

            pages.push(PageOutcome { page, url, status });
        }

        let report = ScrapeReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            pages,
            records,
        };

        if max_pages > 0 && report.pages_failed() == max_pages as usize {
            error!("Every listing page failed; aborting run");
            return Err(ScrapeError::SourceUnreachable {
                pages: max_pages,
                last_error: last_error.unwrap_or_default(),
            });
        }

        if max_pages > 0 && report.records.is_empty() && report.pages_empty() > 0 {
            error!("No listing records on any page; the marker table may be stale");
            return Err(ScrapeError::SourceUnparseable {
                pages: max_pages,
                empty: report.pages_empty(),
            });
        }

        info!(
            "Scrape complete: {} records from {} pages ({} failed, {} empty, {} detail failures)",
            report.records.len(),
            max_pages,
            report.pages_failed(),
            report.pages_empty(),
            report.detail_failures()
        );
        Ok(report)
    }

    /// Records of one page with the number of failed detail fetches, or
    /// `None` when the page has no listing entries
    async fn scrape_page(
        &self,
        page: u32,
        url: &str,
        markup: &str,
    ) -> Option<(Vec<EnrichedRecord>, usize)> {
        let listings = self.parser.parse_str(markup, &ListingContext::new(page, url));
        if listings.is_empty() {
            warn!("No listing records found on page {}", page);
            return None;
        }

        let links: Vec<Option<String>> = listings.iter().map(|r| r.link.clone()).collect();
        let failures_before = self.pool.ledger().len().await;
        let details = self.pool.fetch_details(&links).await;
        let detail_failures = self.pool.ledger().len().await - failures_before;

        let enriched: Vec<EnrichedRecord> = listings
            .into_iter()
            .zip(details)
            .map(|(listing, details)| EnrichedRecord::new(listing, details))
            .collect();

        Some((enriched, detail_failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::failure_ledger::FailureLedger;
    use crate::infrastructure::parsing::DetailParser;
    use crate::test_utils::StaticPageFetcher;

    const TEMPLATE: &str = "https://jobs.example.com/list?sequence={page}";

    fn listing_page(ids: &[u32]) -> String {
        let items: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<li class="clearfix joblistli"><h2><a href="/job/{id}">Job {id}</a></h2></li>"#
                )
            })
            .collect();
        format!(r#"<html><body><ul class="joblist">{items}</ul></body></html>"#)
    }

    fn detail_page(id: u32) -> String {
        format!(r#"<html><body><div class="jd-jobid">Job Id: {id}</div></body></html>"#)
    }

    fn walker(fetcher: StaticPageFetcher, ledger: Arc<FailureLedger>) -> ListingWalker {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(fetcher);
        let pool = DetailFetchPool::new(
            Arc::clone(&fetcher),
            Arc::new(DetailParser::new().unwrap()),
            ledger,
            4,
        );
        ListingWalker::new(fetcher, ListingParser::new().unwrap(), pool, TEMPLATE).unwrap()
    }

    #[tokio::test]
    async fn test_pages_concatenate_in_order() {
        let fetcher = StaticPageFetcher::new()
            .with_page("https://jobs.example.com/list?sequence=1", listing_page(&[1, 2]))
            .with_page("https://jobs.example.com/list?sequence=2", listing_page(&[3]))
            .with_page("https://jobs.example.com/job/1", detail_page(1))
            .with_page("https://jobs.example.com/job/2", detail_page(2))
            .with_page("https://jobs.example.com/job/3", detail_page(3));

        let report = walker(fetcher, Arc::new(FailureLedger::in_memory()))
            .walk(2)
            .await
            .unwrap();

        let ids: Vec<Option<String>> = report
            .records
            .iter()
            .map(|r| r.details.job_id.clone())
            .collect();
        assert_eq!(
            ids,
            vec![
                Some("Job Id: 1".to_string()),
                Some("Job Id: 2".to_string()),
                Some("Job Id: 3".to_string())
            ]
        );
        assert_eq!(report.records[2].listing.title, "Job 3");
        assert_eq!(report.pages.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_page_is_skipped() {
        let fetcher = StaticPageFetcher::new()
            .with_status("https://jobs.example.com/list?sequence=1", 503)
            .with_page("https://jobs.example.com/list?sequence=2", listing_page(&[5]))
            .with_page("https://jobs.example.com/job/5", detail_page(5));

        let report = walker(fetcher, Arc::new(FailureLedger::in_memory()))
            .walk(2)
            .await
            .unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.pages_failed(), 1);
        assert!(matches!(report.pages[0].status, PageStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn test_detail_failure_keeps_row() {
        let ledger = Arc::new(FailureLedger::in_memory());
        let fetcher = StaticPageFetcher::new()
            .with_page("https://jobs.example.com/list?sequence=1", listing_page(&[1, 2]))
            .with_page("https://jobs.example.com/job/1", detail_page(1));

        let report = walker(fetcher, Arc::clone(&ledger)).walk(1).await.unwrap();

        assert_eq!(report.records.len(), 2);
        assert!(report.records[1].details.is_empty());
        assert_eq!(report.detail_failures(), 1);
        assert_eq!(ledger.entries().await[0].url, "https://jobs.example.com/job/2");
    }

    #[tokio::test]
    async fn test_empty_page_contributes_nothing() {
        let fetcher = StaticPageFetcher::new()
            .with_page("https://jobs.example.com/list?sequence=1", "<html><body></body></html>")
            .with_page("https://jobs.example.com/list?sequence=2", listing_page(&[4]))
            .with_page("https://jobs.example.com/job/4", detail_page(4));

        let report = walker(fetcher, Arc::new(FailureLedger::in_memory()))
            .walk(2)
            .await
            .unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.pages_empty(), 1);
        assert_eq!(report.pages[0].status, PageStatus::Empty);
    }

    #[tokio::test]
    async fn test_no_listing_markers_on_any_page_is_unparseable() {
        let renamed = "<html><body><p>renamed markup</p></body></html>";
        let fetcher = StaticPageFetcher::new()
            .with_page("https://jobs.example.com/list?sequence=1", renamed)
            .with_page("https://jobs.example.com/list?sequence=2", renamed);

        let result = walker(fetcher, Arc::new(FailureLedger::in_memory()))
            .walk(2)
            .await;

        assert!(matches!(
            result,
            Err(ScrapeError::SourceUnparseable { pages: 2, empty: 2 })
        ));
    }

    #[tokio::test]
    async fn test_mix_of_failed_and_empty_pages_is_unparseable() {
        let fetcher = StaticPageFetcher::new()
            .with_page("https://jobs.example.com/list?sequence=1", "<html><body></body></html>");

        let result = walker(fetcher, Arc::new(FailureLedger::in_memory()))
            .walk(2)
            .await;

        assert!(matches!(
            result,
            Err(ScrapeError::SourceUnparseable { pages: 2, empty: 1 })
        ));
    }

    #[tokio::test]
    async fn test_all_pages_failed_is_source_unreachable() {
        let result = walker(StaticPageFetcher::new(), Arc::new(FailureLedger::in_memory()))
            .walk(3)
            .await;

        assert!(matches!(
            result,
            Err(ScrapeError::SourceUnreachable { pages: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_pages_is_empty_run() {
        let fetcher = StaticPageFetcher::new();
        let report = walker(fetcher, Arc::new(FailureLedger::in_memory()))
            .walk(0)
            .await
            .unwrap();
        assert!(report.records.is_empty());
        assert!(report.pages.is_empty());
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(StaticPageFetcher::new());
        let pool = DetailFetchPool::new(
            Arc::clone(&fetcher),
            Arc::new(DetailParser::new().unwrap()),
            Arc::new(FailureLedger::in_memory()),
            1,
        );
        let result = ListingWalker::new(
            fetcher,
            ListingParser::new().unwrap(),
            pool,
            "https://jobs.example.com/list",
        );
        assert!(matches!(result, Err(ScrapeError::InvalidUrlTemplate { .. })));
    }

    #[test]
    fn test_page_url() {
        let walker = walker(StaticPageFetcher::new(), Arc::new(FailureLedger::in_memory()));
        assert_eq!(walker.page_url(7), "https://jobs.example.com/list?sequence=7");
    }
}
