//! job-harvester command line

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use job_harvester::application::JobPipeline;
use job_harvester::infrastructure::{
    ConfigManager, HttpClient, HttpClientConfig, init_logging_with_config, log_system_info,
};

#[derive(Parser, Debug)]
#[command(name = "job-harvester")]
#[command(about = "Scrape, clean and load job postings", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true, env = "JOB_HARVESTER_CONFIG")]
    config: Option<PathBuf>,

    /// Override the number of listing pages walked
    #[arg(short, long, global = true)]
    pages: Option<u32>,

    /// Override the log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the listing and write the raw dataset
    Scrape,
    /// Clean the raw dataset into the cleaned dataset
    Clean,
    /// Load the cleaned dataset into the database
    Load,
    /// Scrape, clean and load in one go
    Run,
}

impl Command {
    /// Prefix of the per-run log file
    fn log_stage(&self) -> &'static str {
        match self {
            Command::Scrape | Command::Run => "scraping",
            Command::Clean => "cleaning",
            Command::Load => "loading",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let mut config = manager.load_config().await?;
    if let Some(pages) = cli.pages {
        config.scrape.max_pages = pages;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    let _guard = init_logging_with_config(
        &config.logging,
        &config.paths.log_dir,
        cli.command.log_stage(),
    )?;
    log_system_info();

    let client = HttpClient::new(HttpClientConfig::from_scrape_config(&config.scrape))?;
    let pipeline = JobPipeline::new(config, Arc::new(client));

    let result = execute(&pipeline, &cli.command).await;
    if let Err(e) = &result {
        error!("{:?} failed: {:#}", cli.command, e);
    }
    result
}

async fn execute(pipeline: &JobPipeline, command: &Command) -> Result<()> {
    match command {
        Command::Scrape => {
            let report = pipeline.scrape_to_dataset().await?;
            info!(
                "Scraped {} records ({} pages failed, {} detail fetches failed)",
                report.records.len(),
                report.pages_failed(),
                report.detail_failures()
            );
        }
        Command::Clean => {
            let outcome = pipeline.clean_dataset().await?;
            info!("Cleaned {} records", outcome.records.len());
        }
        Command::Load => {
            let inserted = pipeline.load_dataset().await?;
            info!("Loaded {} new records", inserted);
        }
        Command::Run => {
            let summary = pipeline.run().await?;
            info!(
                "Run complete: {} scraped, {} cleaned, {} inserted",
                summary.scraped, summary.cleaned, summary.inserted
            );
            info!(
                "{} pages failed, {} detail fetches failed",
                summary.failed_pages, summary.failed_details
            );
        }
    }
    Ok(())
}
