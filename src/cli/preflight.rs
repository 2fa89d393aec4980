//! Pre-flight checks before commands that reach external services.
//!
//! Validates that required credentials and configuration are available
//! before starting a server or a conversation that would otherwise fail
//! on the first message.

use crate::config::Settings;
use crate::error::{LuchError, Result};
use std::path::PathBuf;
use tracing::warn;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Conversations need the model and the notifier.
    Converse,
    /// Sending a notification needs only the notifier.
    Notify,
    /// Product lookup reads local files only.
    Products,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Converse => {
            settings.validate()?;
            warn_missing_sources(settings);
        }
        Operation::Notify => {
            check_topic(settings)?;
        }
        Operation::Products => {
            warn_missing_sources(settings);
        }
    }
    Ok(())
}

fn check_topic(settings: &Settings) -> Result<()> {
    match settings.notify.topic.as_deref() {
        Some(topic) if !topic.trim().is_empty() => Ok(()),
        _ => Err(LuchError::Config(
            "NTFY_TOPIC not set. Set it with: export NTFY_TOPIC='my-topic'".to_string(),
        )),
    }
}

/// Configured source files that do not exist.
///
/// Every source is optional, so these only degrade the answers.
pub fn missing_sources(settings: &Settings) -> Vec<(&'static str, PathBuf)> {
    let sources = &settings.sources;
    [
        ("products_file", sources.products_path()),
        ("document_file", sources.document_path()),
        ("text_file", sources.text_path()),
    ]
    .into_iter()
    .filter_map(|(key, path)| path.filter(|p| !p.exists()).map(|p| (key, p)))
    .collect()
}

fn warn_missing_sources(settings: &Settings) {
    for (key, path) in missing_sources(settings) {
        warn!("sources.{} not found, continuing without it: {}", key, path.display());
    }
}
