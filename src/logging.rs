//! Tracing setup for the CLI.

use crate::config::Settings;
use crate::error::{LuchError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// File name of the log written under `general.log_dir`.
pub const LOG_FILE_NAME: &str = "luch.log";

/// Pick the log level from the `-v` count, falling back to the configured level.
pub fn level_for(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Build the filter directive. `RUST_LOG` wins when set.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("luch={}", level)))
}

/// Install the global subscriber.
///
/// Console output goes to stderr. When `general.log_dir` is set, the same
/// events are also appended to `<log_dir>/luch.log`; keep the returned guard
/// alive until exit so buffered lines are flushed.
pub fn init(verbose: u8, settings: &Settings) -> Result<Option<WorkerGuard>> {
    let level = level_for(verbose, &settings.general.log_level);

    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(env_filter(&level));

    let (file, guard) = match settings.log_dir() {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::never(&dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(env_filter(&level));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| LuchError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0, "warn"), "warn");
        assert_eq!(level_for(1, "warn"), "debug");
        assert_eq!(level_for(3, "info"), "trace");
    }
}
