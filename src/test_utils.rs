//! Test utilities for job-harvester
//!
//! An in-memory `PageFetcher` that serves canned markup, so the walker and
//! fetch pool can be exercised without network access.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::infrastructure::http_client::{FetchError, PageFetcher};

/// Canned outcome for one URL
#[derive(Debug, Clone)]
pub enum CannedResponse {
    Page(String),
    Fail(FetchError),
    /// The fetch task panics
    Panic,
}

/// Serves canned responses by URL. Unknown URLs answer with status 404.
#[derive(Debug, Default)]
pub struct StaticPageFetcher {
    routes: HashMap<String, CannedResponse>,
    delay: Option<Duration>,
    requests: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StaticPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, markup: impl Into<String>) -> Self {
        self.routes
            .insert(url.into(), CannedResponse::Page(markup.into()));
        self
    }

    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        let url = url.into();
        let error = FetchError::Status {
            url: url.clone(),
            status,
        };
        self.routes.insert(url, CannedResponse::Fail(error));
        self
    }

    pub fn with_panic(mut self, url: impl Into<String>) -> Self {
        self.routes.insert(url.into(), CannedResponse::Panic);
        self
    }

    /// Hold every request for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Highest number of requests observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageFetcher for StaticPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.routes.get(url) {
            Some(CannedResponse::Page(markup)) => Ok(markup.clone()),
            Some(CannedResponse::Fail(error)) => Err(error.clone()),
            Some(CannedResponse::Panic) => panic!("canned panic for {url}"),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
