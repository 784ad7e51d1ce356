//! Append-only ledger of detail URLs that could not be fetched or parsed
//!
//! One line per failure, appended as it happens. Entries are never removed
//! or deduplicated within a run. Appends are serialized behind a mutex so
//! concurrent fetch tasks never interleave lines.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::infrastructure::config::non_empty_parent;

/// One failed URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub url: String,
}

struct LedgerState {
    file: Option<File>,
    entries: Vec<FailureEntry>,
}

pub struct FailureLedger {
    path: Option<PathBuf>,
    state: Mutex<LedgerState>,
}

impl FailureLedger {
    /// Ledger appending to `path`. Existing content is kept.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = non_empty_parent(path) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create ledger directory {:?}", parent))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to open failure ledger {:?}", path))?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            state: Mutex::new(LedgerState {
                file: Some(file),
                entries: Vec::new(),
            }),
        })
    }

    /// Ledger without a backing file
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(LedgerState {
                file: None,
                entries: Vec::new(),
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one failed URL. A write error is logged and the entry is still
    /// kept in memory.
    pub async fn record(&self, url: &str) {
        let mut state = self.state.lock().await;
        state.entries.push(FailureEntry {
            url: url.to_string(),
        });

        if let Some(file) = state.file.as_mut() {
            let line = format!("{url}\n");
            let written = match file.write_all(line.as_bytes()).await {
                Ok(()) => file.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                warn!("Failed to append {} to failure ledger: {}", url, e);
            }
        }
        debug!("Recorded failed link: {}", url);
    }

    /// Entries recorded by this ledger instance, in append order
    pub async fn entries(&self) -> Vec<FailureEntry> {
        self.state.lock().await.entries.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_in_memory_keeps_order_and_duplicates() {
        let ledger = FailureLedger::in_memory();
        ledger.record("https://a.example/1").await;
        ledger.record("https://a.example/2").await;
        ledger.record("https://a.example/1").await;

        let urls: Vec<String> = ledger.entries().await.into_iter().map(|e| e.url).collect();
        assert_eq!(
            urls,
            vec!["https://a.example/1", "https://a.example/2", "https://a.example/1"]
        );
    }

    #[tokio::test]
    async fn test_file_is_appended_not_truncated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("failed_links.txt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "https://old.example/0\n").unwrap();

        let ledger = FailureLedger::open(&path).await.unwrap();
        ledger.record("https://a.example/1").await;
        drop(ledger);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "https://old.example/0\nhttps://a.example/1\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("failed_links.txt");
        let ledger = Arc::new(FailureLedger::open(&path).await.unwrap());

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                tokio::spawn(async move {
                    ledger.record(&format!("https://jobs.example.com/job/{i}")).await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(ledger.len().await, 50);
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 50);
        assert!(lines.iter().all(|l| l.starts_with("https://jobs.example.com/job/")));
    }
}
