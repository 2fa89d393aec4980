//! Notify command - send a test notification to the team.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::notify::{Notifier, NtfyNotifier};
use anyhow::Result;

/// Run the notify command.
pub async fn run_notify(title: &str, message: &str, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Notify, settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let notifier = NtfyNotifier::from_settings(&settings.notify)?;
    Output::info(&format!("Sending to {}", notifier.url()));

    if notifier.notify(title, message).await {
        Output::success("Notification sent.");
        Ok(())
    } else {
        Output::error("Notification was not delivered. Check the logs for details.");
        anyhow::bail!("notification delivery failed")
    }
}
