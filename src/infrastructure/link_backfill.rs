//! Backfill of absent columns from detail pages
//!
//! Rows whose skills or location are absent get a second look at their
//! detail link. Each link is fetched at most once per pass. A failed fetch or
//! a page without the marker leaves the column absent; nothing is recorded
//! in the failure ledger.

use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::job::{Column, JobRow};
use crate::infrastructure::http_client::PageFetcher;
use crate::infrastructure::parsing::{
    BackfillMarkers, ParsingResult, compile_selector, element_text,
};

struct BackfillTarget {
    column: Column,
    container: Selector,
    value: Selector,
}

pub struct LinkBackfill {
    fetcher: Arc<dyn PageFetcher>,
    targets: Vec<BackfillTarget>,
    max_concurrent: usize,
}

impl LinkBackfill {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        markers: &BackfillMarkers,
        max_concurrent: usize,
    ) -> ParsingResult<Self> {
        let targets = vec![
            BackfillTarget {
                column: Column::Skills,
                container: compile_selector("skills_container", &markers.skills_container)?,
                value: compile_selector("skills_value", &markers.skills_value)?,
            },
            BackfillTarget {
                column: Column::Location,
                container: compile_selector("location_container", &markers.location_container)?,
                value: compile_selector("location_value", &markers.location_value)?,
            },
        ];

        Ok(Self {
            fetcher,
            targets,
            max_concurrent: max_concurrent.max(1),
        })
    }

    /// Fill absent target columns in place. Returns the number of values filled.
    pub async fn backfill(&self, rows: &mut [JobRow]) -> usize {
        // link -> rows that need it, each with its absent columns
        let mut pending: BTreeMap<String, Vec<(usize, Vec<Column>)>> = BTreeMap::new();
        for (index, row) in rows.iter().enumerate() {
            let Some(link) = row.get(Column::Link) else {
                continue;
            };
            let missing: Vec<Column> = self
                .targets
                .iter()
                .map(|t| t.column)
                .filter(|column| row.get(*column).is_none())
                .collect();
            if !missing.is_empty() {
                pending
                    .entry(link.to_string())
                    .or_default()
                    .push((index, missing));
            }
        }

        if pending.is_empty() {
            return 0;
        }
        info!("Fetching additional data from {} job links", pending.len());

        let found: Vec<(Vec<(usize, Vec<Column>)>, Vec<(Column, String)>)> =
            stream::iter(pending)
                .map(|(link, wanted)| async move {
                    let mut columns: Vec<Column> =
                        wanted.iter().flat_map(|(_, missing)| missing.clone()).collect();
                    columns.sort();
                    columns.dedup();

                    let values = match self.fetcher.fetch_page(&link).await {
                        Ok(markup) => self.extract(&markup, &columns),
                        Err(e) => {
                            debug!("Backfill fetch failed: {}", e);
                            Vec::new()
                        }
                    };
                    (wanted, values)
                })
                .buffered(self.max_concurrent)
                .collect()
                .await;

        let mut filled = 0;
        for (wanted, values) in found {
            for (index, missing) in wanted {
                for (column, value) in &values {
                    if missing.contains(column) {
                        rows[index].set(*column, Some(value.clone()));
                        filled += 1;
                    }
                }
            }
        }

        info!("Backfilled {} values from job links", filled);
        filled
    }

    /// Non-empty values for `columns` found in `markup`
    fn extract(&self, markup: &str, columns: &[Column]) -> Vec<(Column, String)> {
        let document = Html::parse_document(markup);
        self.targets
            .iter()
            .filter(|target| columns.contains(&target.column))
            .filter_map(|target| {
                let container = document.select(&target.container).next()?;
                let value = element_text(container.select(&target.value).next()?);
                (!value.is_empty()).then_some((target.column, value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StaticPageFetcher;

    const DETAIL: &str = r#"<html><body>
        <div class="job-skills"><span> Rust, Tokio </span></div>
        <div class="location-text__ mt-8"><span>Bengaluru</span></div>
    </body></html>"#;

    fn row(link: Option<&str>, skills: Option<&str>, location: Option<&str>) -> JobRow {
        JobRow {
            link: link.map(ToString::to_string),
            skills: skills.map(ToString::to_string),
            location: location.map(ToString::to_string),
            ..JobRow::default()
        }
    }

    fn backfill(fetcher: Arc<StaticPageFetcher>) -> LinkBackfill {
        LinkBackfill::new(fetcher, &BackfillMarkers::default(), 4).unwrap()
    }

    #[tokio::test]
    async fn test_fills_only_absent_columns() {
        let fetcher = Arc::new(StaticPageFetcher::new().with_page("https://j.example/1", DETAIL));
        let mut rows = vec![row(Some("https://j.example/1"), Some("SQL"), None)];

        let filled = backfill(Arc::clone(&fetcher)).backfill(&mut rows).await;

        assert_eq!(filled, 1);
        assert_eq!(rows[0].skills.as_deref(), Some("SQL"));
        assert_eq!(rows[0].location.as_deref(), Some("Bengaluru"));
    }

    #[tokio::test]
    async fn test_complete_rows_and_linkless_rows_are_not_fetched() {
        let fetcher = Arc::new(StaticPageFetcher::new());
        let mut rows = vec![
            row(Some("https://j.example/1"), Some("SQL"), Some("Pune")),
            row(None, None, None),
        ];

        let filled = backfill(Arc::clone(&fetcher)).backfill(&mut rows).await;

        assert_eq!(filled, 0);
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_shared_link_is_fetched_once() {
        let fetcher = Arc::new(StaticPageFetcher::new().with_page("https://j.example/1", DETAIL));
        let mut rows = vec![
            row(Some("https://j.example/1"), None, Some("Pune")),
            row(Some("https://j.example/1"), Some("SQL"), None),
        ];

        let filled = backfill(Arc::clone(&fetcher)).backfill(&mut rows).await;

        assert_eq!(filled, 2);
        assert_eq!(fetcher.requests(), vec!["https://j.example/1".to_string()]);
        assert_eq!(rows[0].skills.as_deref(), Some("Rust, Tokio"));
        assert_eq!(rows[0].location.as_deref(), Some("Pune"));
        assert_eq!(rows[1].skills.as_deref(), Some("SQL"));
        assert_eq!(rows[1].location.as_deref(), Some("Bengaluru"));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_column_absent() {
        let fetcher = Arc::new(StaticPageFetcher::new().with_status("https://j.example/2", 500));
        let mut rows = vec![row(Some("https://j.example/2"), None, None)];

        let filled = backfill(Arc::clone(&fetcher)).backfill(&mut rows).await;

        assert_eq!(filled, 0);
        assert_eq!(rows[0].skills, None);
        assert_eq!(fetcher.requests(), vec!["https://j.example/2".to_string()]);
    }
}
