//! Logging system configuration and initialization
//!
//! Console output plus an optional per-run log file named
//! `<stage>_YYYYmmdd_HHMMSS.log` (`scraping`, `cleaning`, `loading`).
//! `RUST_LOG` overrides the configured filter.
//! The returned `LoggingGuard` must be held for the life of the process or
//! buffered file output is lost.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

/// Local wall-clock timestamps with milliseconds
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Keeps the non-blocking file writer alive
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggingGuard {
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// File name for a `stage` run started now
pub fn log_file_name(stage: &str) -> String {
    format!("{}_{}.log", stage, Local::now().format("%Y%m%d_%H%M%S"))
}

/// Directives added on top of the base level. Empty at trace level.
fn quiet_directives(config: &LoggingConfig) -> Vec<String> {
    if config.level.to_lowercase().contains("trace") {
        return Vec::new();
    }

    config
        .module_filters
        .iter()
        .map(|(module, level)| format!("{}={}", module, level))
        .chain(std::iter::once(format!("job_harvester={}", config.level)))
        .collect()
}

/// Initialize logging with custom configuration
///
/// # Environment Variable Override
/// ```bash
/// RUST_LOG="debug,sqlx::query=debug" job-harvester scrape
/// ```
pub fn init_logging_with_config(
    config: &LoggingConfig,
    log_dir: &Path,
    stage: &str,
) -> Result<LoggingGuard> {
    let mut rejected = Vec::new();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        quiet_directives(config)
            .into_iter()
            .fold(EnvFilter::new(&config.level), |filter, directive| {
                match directive.parse() {
                    Ok(parsed) => filter.add_directive(parsed),
                    Err(_) => {
                        rejected.push(directive);
                        filter
                    }
                }
            })
    });

    let (file_writer, file_guard, log_file) = if config.file_output {
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;
        let file_name = log_file_name(stage);
        let (writer, guard) = non_blocking(rolling::never(log_dir, &file_name));
        (Some(writer), Some(guard), Some(log_dir.join(file_name)))
    } else {
        (None, None, None)
    };

    if !config.console_output && file_writer.is_none() {
        return Err(anyhow!("No logging output configured"));
    }

    let json_file_layer = file_writer
        .clone()
        .filter(|_| config.json_format)
        .map(|writer| {
            fmt::Layer::new()
                .json()
                .with_writer(writer)
                .with_timer(LocalTimeFormatter)
                .with_target(true)
                .with_current_span(true)
                .with_ansi(false)
        });

    let plain_file_layer = file_writer
        .filter(|_| !config.json_format)
        .map(|writer| {
            fmt::Layer::new()
                .with_writer(writer)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .with_ansi(false)
        });

    let console_layer = config.console_output.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
    });

    Registry::default()
        .with(env_filter)
        .with(json_file_layer)
        .with(plain_file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    for directive in rejected {
        warn!("Ignoring invalid log directive: {}", directive);
    }

    info!("Logging system initialized");
    info!("Log level: {}", config.level);
    if let Some(path) = &log_file {
        info!("Log file: {:?}", path);
    }

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_file,
    })
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}
