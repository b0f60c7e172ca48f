//! Log setup: console output plus an optional daily-rotated JSON file.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LogConfig;

const LOG_FILE_PREFIX: &str = "wecom-notifier";
const LOG_FILE_SUFFIX: &str = "log";

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `LOG_LEVEL`.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid LOG_LEVEL {:?}", config.level))?,
    };

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true);

    let (file_layer, guard) = if config.rotate {
        let (writer, guard) = tracing_appender::non_blocking(file_appender(config)?);
        let layer = fmt::layer()
            .json()
            .with_ansi(false)
            .with_line_number(true)
            .with_writer(writer);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// Daily-rotated appender that keeps at most `max_age_days` files.
pub fn file_appender(config: &LogConfig) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(&config.dir)
        .with_context(|| format!("Failed to create log directory {}", config.dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(config.max_age_days.max(1))
        .build(&config.dir)
        .context("Failed to create log file appender")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_appender_creates_directory_and_file() {
        let temp = tempfile::tempdir().unwrap();
        let config = LogConfig {
            dir: temp.path().join("nested").join("logs"),
            ..LogConfig::default()
        };

        let mut appender = file_appender(&config).unwrap();
        appender.write_all(b"{\"msg\":\"hello\"}\n").unwrap();
        appender.flush().unwrap();

        let files: Vec<_> = std::fs::read_dir(&config.dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with(LOG_FILE_PREFIX));
        assert!(files[0].ends_with(LOG_FILE_SUFFIX));
    }
}
