//! File logging for metajudge.
//!
//! The TUI owns the terminal, so every binary logs to a daily file under
//! `$XDG_STATE_HOME/metajudge/`, named `metajudge.YYYY-MM-DD.log`. Old days
//! are pruned down to `[logging] max_files`.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_PREFIX: &str = "metajudge";
const LOG_SUFFIX: &str = "log";

/// Keeps the background log writer alive; pending lines are flushed on drop.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Start file logging for a binary.
///
/// `RUST_LOG` overrides the configured level. A level the filter cannot
/// parse is a configuration error rather than a silent fallback.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_dir = Config::state_dir();
    let filter = resolve_filter(&config.level, std::env::var("RUST_LOG").ok().as_deref())?;
    let appender = daily_appender(&log_dir, config.max_files)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %config.level,
        max_files = config.max_files,
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Send log output to the test harness; safe to call from every test.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// The log file written on `date`.
pub fn log_file_path(date: NaiveDate) -> PathBuf {
    Config::state_dir().join(log_file_name(date))
}

fn log_file_name(date: NaiveDate) -> String {
    format!("{}.{}.{}", LOG_PREFIX, date.format("%Y-%m-%d"), LOG_SUFFIX)
}

/// A non-empty `RUST_LOG` wins over the configured level.
fn resolve_filter(level: &str, env: Option<&str>) -> Result<EnvFilter> {
    let (directives, source) = match env.map(str::trim).filter(|e| !e.is_empty()) {
        Some(env) => (env, "RUST_LOG"),
        None => (level.trim(), "logging.level"),
    };
    EnvFilter::try_new(directives)
        .map_err(|e| Error::Config(format!("invalid {} '{}': {}", source, directives, e)))
}

fn daily_appender(log_dir: &Path, max_files: usize) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(max_files.max(1))
        .build(log_dir)
        .map_err(|e| {
            Error::Config(format!(
                "cannot write logs to {}: {}",
                log_dir.display(),
                e
            ))
        })
}
