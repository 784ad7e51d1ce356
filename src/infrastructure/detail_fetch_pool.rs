//! Bounded-concurrency fetch and parse of detail pages
//!
//! Output is index-aligned with the input links. A failed link (transport
//! error, non-success status, or a panicking fetch task) yields an empty
//! `DetailAttributes` in its slot and one ledger entry; it never aborts the
//! remaining fetches.

#[cfg(not(panic = "unwind"))]
compile_error!("detail fetch isolation needs panic = \"unwind\"");

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::domain::job::DetailAttributes;
use crate::infrastructure::failure_ledger::FailureLedger;
use crate::infrastructure::http_client::PageFetcher;
use crate::infrastructure::parsing::{ContextualParser, DetailContext, DetailParser};

pub struct DetailFetchPool {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<DetailParser>,
    ledger: Arc<FailureLedger>,
    max_concurrent: usize,
}

impl DetailFetchPool {
    /// `max_concurrent` of 0 is treated as 1
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<DetailParser>,
        ledger: Arc<FailureLedger>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            fetcher,
            parser,
            ledger,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn ledger(&self) -> &Arc<FailureLedger> {
        &self.ledger
    }

    /// Fetch every link. Absent links are not fetched and yield empty slots.
    pub async fn fetch_details(&self, links: &[Option<String>]) -> Vec<DetailAttributes> {
        debug!(
            "Fetching {} detail pages with up to {} in flight",
            links.len(),
            self.max_concurrent
        );

        // At most `max_concurrent` tasks exist at once; `buffered` keeps input order.
        let details: Vec<DetailAttributes> = stream::iter(links.iter().cloned())
            .map(|link| {
                let fetcher = Arc::clone(&self.fetcher);
                let parser = Arc::clone(&self.parser);
                let ledger = Arc::clone(&self.ledger);
                async move {
                    let Some(url) = link else {
                        return DetailAttributes::empty();
                    };

                    let task = tokio::spawn(Self::fetch_one(
                        fetcher,
                        parser,
                        Arc::clone(&ledger),
                        url.clone(),
                    ));
                    match task.await {
                        Ok(details) => details,
                        Err(e) => {
                            error!("Detail task for {} aborted: {}", url, e);
                            ledger.record(&url).await;
                            DetailAttributes::empty()
                        }
                    }
                }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        debug!(
            "Collected {} detail slots ({} empty)",
            details.len(),
            details.iter().filter(|d| d.is_empty()).count()
        );
        details
    }

    async fn fetch_one(
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<DetailParser>,
        ledger: Arc<FailureLedger>,
        url: String,
    ) -> DetailAttributes {
        debug!("Processing job link: {}", url);

        match fetcher.fetch_page(&url).await {
            Ok(body) => parser.parse_str(&body, &DetailContext::new(url.as_str())),
            Err(e) => {
                warn!("Detail fetch failed: {}", e);
                ledger.record(&url).await;
                DetailAttributes::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StaticPageFetcher;
    use std::time::Duration;

    fn detail_page(job_id: u32) -> String {
        format!(
            r#"<html><body><div class="jd-jobid">Job Id: {job_id}</div>
            <ul id="applyFlowHideDetails_1">
              <li class="clearfix"><label>Role:</label><span class="basic-info-dtl">Developer</span></li>
            </ul></body></html>"#
        )
    }

    fn link(i: usize) -> String {
        format!("https://jobs.example.com/job/{i}")
    }

    fn pool(
        fetcher: Arc<StaticPageFetcher>,
        ledger: Arc<FailureLedger>,
        size: usize,
    ) -> DetailFetchPool {
        DetailFetchPool::new(fetcher, Arc::new(DetailParser::new().unwrap()), ledger, size)
    }

    #[tokio::test]
    async fn test_failed_link_leaves_empty_slot_and_one_ledger_entry() {
        let n = 6;
        let k = 3;
        let mut fetcher = StaticPageFetcher::new();
        for i in 0..n {
            fetcher = if i == k {
                fetcher.with_status(link(i), 500)
            } else {
                fetcher.with_page(link(i), detail_page(1000 + i as u32))
            };
        }
        let ledger = Arc::new(FailureLedger::in_memory());
        let links: Vec<Option<String>> = (0..n).map(|i| Some(link(i))).collect();

        let details = pool(Arc::new(fetcher), Arc::clone(&ledger), 2)
            .fetch_details(&links)
            .await;

        assert_eq!(details.len(), n);
        assert!(details[k].is_empty());
        for (i, slot) in details.iter().enumerate().filter(|(i, _)| *i != k) {
            assert_eq!(slot.job_id, Some(format!("Job Id: {}", 1000 + i)));
        }
        let failed: Vec<String> = ledger.entries().await.into_iter().map(|e| e.url).collect();
        assert_eq!(failed, vec![link(k)]);
    }

    #[tokio::test]
    async fn test_panicking_fetch_is_isolated() {
        let fetcher = StaticPageFetcher::new()
            .with_page(link(0), detail_page(1))
            .with_panic(link(1))
            .with_page(link(2), detail_page(3));
        let ledger = Arc::new(FailureLedger::in_memory());
        let links = vec![Some(link(0)), Some(link(1)), Some(link(2))];

        let details = pool(Arc::new(fetcher), Arc::clone(&ledger), 3)
            .fetch_details(&links)
            .await;

        assert_eq!(details.len(), 3);
        assert!(!details[0].is_empty());
        assert!(details[1].is_empty());
        assert!(!details[2].is_empty());
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_absent_link_is_not_fetched() {
        let fetcher = Arc::new(StaticPageFetcher::new().with_page(link(0), detail_page(7)));
        let ledger = Arc::new(FailureLedger::in_memory());

        let details = pool(Arc::clone(&fetcher), Arc::clone(&ledger), 4)
            .fetch_details(&[None, Some(link(0))])
            .await;

        assert!(details[0].is_empty());
        assert_eq!(details[1].get("Role"), Some("Developer"));
        assert_eq!(fetcher.requests(), vec![link(0)]);
        assert!(ledger.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let mut fetcher = StaticPageFetcher::new().with_delay(Duration::from_millis(20));
        for i in 0..12 {
            fetcher = fetcher.with_page(link(i), detail_page(i as u32));
        }
        let fetcher = Arc::new(fetcher);
        let links: Vec<Option<String>> = (0..12).map(|i| Some(link(i))).collect();

        let details = pool(Arc::clone(&fetcher), Arc::new(FailureLedger::in_memory()), 3)
            .fetch_details(&links)
            .await;

        assert_eq!(details.len(), 12);
        assert!(fetcher.max_in_flight() <= 3);
        assert!(fetcher.max_in_flight() >= 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let details = pool(
            Arc::new(StaticPageFetcher::new()),
            Arc::new(FailureLedger::in_memory()),
            4,
        )
        .fetch_details(&[])
        .await;
        assert!(details.is_empty());
    }
}
