//! Dataset files
//!
//! Record sets are exchanged between pipeline stages as JSON Lines, one
//! record per line. A missing file reads as an empty set.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::infrastructure::config::non_empty_parent;

/// Write `records` to `path`, replacing any previous content
pub async fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<usize> {
    if let Some(parent) = non_empty_parent(path) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dataset directory {:?}", parent))?;
    }

    let mut content = String::new();
    for record in records {
        let line = serde_json::to_string(record).context("Failed to serialize record")?;
        content.push_str(&line);
        content.push('\n');
    }

    fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write dataset {:?}", path))?;

    info!("Data saved to {:?} ({} records)", path, records.len());
    Ok(records.len())
}

/// Read every record from `path`. Blank lines are skipped.
pub async fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        warn!("File {:?} not found, continuing with an empty record set", path);
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read dataset {:?}", path))?;

    let records = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid record on line {} of {:?}", index + 1, path))
        })
        .collect::<Result<Vec<T>>>()?;

    info!("Loaded {} records from {:?}", records.len(), path);
    Ok(records)
}
