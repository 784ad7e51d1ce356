//! Configuration infrastructure
//!
//! Configuration is a single JSON document with three sections:
//! 1. `scrape` - source URL template, paging and fetch behavior, marker table
//! 2. `paths` - dataset, ledger, log and database locations
//! 3. `logging` - subscriber settings
//!
//! Every section defaults field by field, so a partial file is valid.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::infrastructure::parsing::ParsingConfig;

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub scrape: ScrapeConfig,
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
}

/// Scrape behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Listing URL with a `{page}` placeholder
    pub url_template: String,

    /// Pages walked per run, starting at 1
    pub max_pages: u32,

    /// Size of the detail fetch pool
    pub detail_max_concurrent: usize,

    /// Per-request timeout
    pub request_timeout_seconds: u64,

    pub user_agent: String,

    pub follow_redirects: bool,

    /// Fetch absent skills and location from each row's detail page while cleaning
    pub backfill_missing: bool,

    /// Structural markers the extractor relies on
    pub markers: ParsingConfig,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            url_template: defaults::URL_TEMPLATE.to_string(),
            max_pages: defaults::MAX_PAGES,
            detail_max_concurrent: defaults::DETAIL_MAX_CONCURRENT,
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            user_agent: defaults::USER_AGENT.to_string(),
            follow_redirects: true,
            backfill_missing: true,
            markers: ParsingConfig::default(),
        }
    }
}

/// File system locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Enriched records as scraped (JSON Lines)
    pub raw_dataset: PathBuf,

    /// Canonical records after cleaning (JSON Lines)
    pub cleaned_dataset: PathBuf,

    /// One failed detail URL per line
    pub failure_ledger: PathBuf,

    pub log_dir: PathBuf,

    /// sqlx connection string
    pub database_url: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dataset: PathBuf::from(defaults::RAW_DATASET),
            cleaned_dataset: PathBuf::from(defaults::CLEANED_DATASET),
            failure_ledger: PathBuf::from(defaults::FAILURE_LEDGER),
            log_dir: PathBuf::from(defaults::LOG_DIR),
            database_url: defaults::DATABASE_URL.to_string(),
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    pub console_output: bool,

    /// Write a timestamped log file per run into `paths.log_dir`
    pub file_output: bool,

    /// Module-specific levels applied unless the level is "trace"
    pub module_filters: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let module_filters = [
            ("sqlx", "warn"),
            ("reqwest", "info"),
            ("hyper", "warn"),
            ("html5ever", "warn"),
        ]
        .into_iter()
        .map(|(module, level)| (module.to_string(), level.to_string()))
        .collect();

        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: true,
            module_filters,
        }
    }
}

/// Loads and saves the JSON configuration file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Manager for the default config file location
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            info!(
                "Configuration file not found, creating default: {:?}",
                self.config_path
            );
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read configuration file {:?}", self.config_path))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration file {:?}", self.config_path))?;

        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = non_empty_parent(&self.config_path) {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Parent directory of `path`, if it names one
pub(crate) fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|parent| !parent.as_os_str().is_empty())
}

/// Default values
pub mod defaults {
    /// TimesJobs IT-software listing
    pub const URL_TEMPLATE: &str =
        "https://www.timesjobs.com/jobfunction/it-software-jobs/&sequence={page}&startPage=1";

    /// Placeholder substituted with the page number
    pub const PAGE_PLACEHOLDER: &str = "{page}";

    pub const MAX_PAGES: u32 = 100;

    pub const DETAIL_MAX_CONCURRENT: usize = 10;

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    pub const USER_AGENT: &str = concat!("job-harvester/", env!("CARGO_PKG_VERSION"));

    pub const RAW_DATASET: &str = "data/raw/jobs_data_with_details.jsonl";

    pub const CLEANED_DATASET: &str = "data/cleaned/cleaned_jobs_data.jsonl";

    pub const FAILURE_LEDGER: &str = "data/logs/failed_links.txt";

    pub const LOG_DIR: &str = "data/logs";

    pub const DATABASE_URL: &str = "sqlite://data/jobs.db?mode=rwc";

    pub const LOG_LEVEL: &str = "info";

    pub const APP_DIR_NAME: &str = "job-harvester";

    pub const CONFIG_FILE_NAME: &str = "config.json";
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.scrape.max_pages, 100);
        assert_eq!(config.scrape.detail_max_concurrent, 10);
        assert_eq!(config.scrape.request_timeout_seconds, 30);
        assert!(config.scrape.url_template.contains(defaults::PAGE_PLACEHOLDER));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"scrape": {"max_pages": 3}, "logging": {"level": "debug"}}"#)
                .unwrap();

        assert_eq!(config.scrape.max_pages, 3);
        assert_eq!(config.scrape.detail_max_concurrent, 10);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.console_output);
        assert_eq!(config.paths, PathsConfig::default());
    }

    #[tokio::test]
    async fn test_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let manager = ConfigManager::with_path(&path);

        let config = manager.load_config().await.unwrap();

        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));

        let mut config = AppConfig::default();
        config.scrape.max_pages = 7;
        config.paths.database_url = "sqlite::memory:".to_string();
        manager.save_config(&config).await.unwrap();

        assert_eq!(manager.load_config().await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = ConfigManager::with_path(&path).load_config().await;
        assert!(result.is_err());
    }
}
