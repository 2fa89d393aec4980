//! ntfy-compatible topic notifier.

use super::Notifier;
use crate::config::NotifySettings;
use crate::error::{LuchError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Default timeout for notification requests.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Posts notifications to `{server}/{topic}`.
///
/// Each notification is two requests: the plain message body, then the same
/// body with `Title` and `Tags` headers. Delivery counts as successful when
/// the first request returns HTTP 200.
pub struct NtfyNotifier {
    client: reqwest::Client,
    url: String,
    tags: String,
}

impl NtfyNotifier {
    /// Create a notifier for a server and topic.
    pub fn new(server: &str, topic: &str, tags: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            url: topic_url(server, topic)?,
            tags: tags.to_string(),
        })
    }

    /// Create a notifier from settings. The topic must be set.
    pub fn from_settings(settings: &NotifySettings) -> Result<Self> {
        let topic = settings
            .topic
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LuchError::Config("NTFY_TOPIC not set".to_string()))?;
        Self::new(&settings.server, topic, &settings.tags)
    }

    /// Topic URL notifications are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn deliver(&self, title: &str, message: &str) -> reqwest::Result<StatusCode> {
        let response = self
            .client
            .post(&self.url)
            .body(message.to_string())
            .send()
            .await?;

        self.client
            .post(&self.url)
            .header("Title", title)
            .header("Tags", &self.tags)
            .body(message.to_string())
            .send()
            .await?;

        Ok(response.status())
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    #[instrument(skip(self, message))]
    async fn notify(&self, title: &str, message: &str) -> bool {
        match self.deliver(title, message).await {
            Ok(status) if status == StatusCode::OK => {
                info!("Notification sent: {} - {}", title, message);
                true
            }
            Ok(status) => {
                warn!("Notification failed with status {}: {} - {}", status, title, message);
                false
            }
            Err(e) => {
                warn!("Notification failed: {} - {}. Error: {}", title, message, e);
                false
            }
        }
    }
}

/// Join server and topic into a URL.
fn topic_url(server: &str, topic: &str) -> Result<String> {
    let base = url::Url::parse(server).map_err(|e| {
        LuchError::Config(format!("invalid notification server '{}': {}", server, e))
    })?;
    let topic = topic.trim_matches('/');
    if topic.is_empty() {
        return Err(LuchError::Config("notification topic is empty".to_string()));
    }
    Ok(format!("{}/{}", base.as_str().trim_end_matches('/'), topic))
}
