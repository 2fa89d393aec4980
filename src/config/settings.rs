//! Configuration settings for Luch.

use crate::error::{LuchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Name of the config file looked up in the working directory.
const LOCAL_CONFIG_FILE: &str = "luch.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub agent: AgentSettings,
    pub ui: UiSettings,
    pub server: ServerSettings,
    pub sources: SourceSettings,
    pub model: ModelSettings,
    pub notify: NotifySettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Directory for log files. Console-only logging when unset.
    pub log_dir: Option<String>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

/// Identity the agent presents to users.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub name: String,
    pub company: String,
    pub role: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: "Luch".to_string(),
            company: "Our Company".to_string(),
            role: "Sales and Support Assistant".to_string(),
        }
    }
}

/// Chat widget theme.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UiTheme {
    #[default]
    Soft,
    Classic,
    Dark,
}

impl std::str::FromStr for UiTheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "soft" => Ok(UiTheme::Soft),
            "classic" => Ok(UiTheme::Classic),
            "dark" => Ok(UiTheme::Dark),
            _ => Err(format!("Unknown UI theme: {}", s)),
        }
    }
}

impl std::fmt::Display for UiTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UiTheme::Soft => write!(f, "soft"),
            UiTheme::Classic => write!(f, "classic"),
            UiTheme::Dark => write!(f, "dark"),
        }
    }
}

/// Web chat widget labels and behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub title: String,
    pub description: String,
    pub theme: UiTheme,
    /// Keep the conversation in browser local storage between page loads.
    pub save_history: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            title: "Chat with us".to_string(),
            description: "Ask anything about our products and services.".to_string(),
            theme: UiTheme::Soft,
            save_history: false,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7860,
        }
    }
}

/// Knowledge source files. Every source is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SourceSettings {
    /// CSV table of products; needs `name` and `price` columns.
    pub products_file: Option<String>,
    /// PDF describing products and services.
    pub document_file: Option<String>,
    /// Plain text about the company.
    pub text_file: Option<String>,
}

impl SourceSettings {
    pub fn products_path(&self) -> Option<PathBuf> {
        self.products_file.as_deref().map(Settings::expand_path)
    }

    pub fn document_path(&self) -> Option<PathBuf> {
        self.document_file.as_deref().map(Settings::expand_path)
    }

    pub fn text_path(&self) -> Option<PathBuf> {
        self.text_file.as_deref().map(Settings::expand_path)
    }
}

/// Model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Chat model name.
    pub model: String,
    /// Base URL of an OpenAI-compatible API. Provider default when unset.
    pub base_url: Option<String>,
    /// API key. Read from `AI_API_KEY`, never written back to disk.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Maximum model calls per user turn.
    pub max_rounds: usize,
    /// Timeout for a single model call.
    pub round_timeout_secs: u64,
    /// Timeout for the underlying HTTP request.
    pub request_timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            api_key: None,
            max_rounds: 8,
            round_timeout_secs: 60,
            request_timeout_secs: 120,
        }
    }
}

impl ModelSettings {
    pub fn round_timeout(&self) -> Duration {
        Duration::from_secs(self.round_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Push notification settings (ntfy-compatible server).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySettings {
    pub server: String,
    pub topic: Option<String>,
    /// Value of the `Tags` header on the titled notification.
    pub tags: String,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            server: "https://ntfy.sh".to_string(),
            topic: None,
            tags: "loudspeaker".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// File with a custom system prompt template.
    pub system_prompt_file: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file, then apply the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or the default location if None.
    ///
    /// A `.env` file in the working directory is read first and its values
    /// override the process environment. A missing `.env` is fine; one that
    /// cannot be read or parsed is an error.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        check_dotenv(dotenvy::dotenv_override())?;

        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Settings>(&content)?
        } else if path.is_some() {
            return Err(LuchError::Config(format!(
                "config file not found: {}",
                config_path.display()
            )));
        } else {
            Settings::default()
        };

        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Override file values with environment variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("AI_API_KEY") {
            self.model.api_key = Some(key);
        }
        if let Some(base_url) = lookup("AI_BASE_URL") {
            self.model.base_url = Some(base_url);
        }
        if let Some(model) = lookup("AI_MODEL") {
            self.model.model = model;
        }
        if let Some(topic) = lookup("NTFY_TOPIC") {
            self.notify.topic = Some(topic);
        }
        if let Some(server) = lookup("NTFY_SERVER") {
            self.notify.server = server;
        }
    }

    /// Check the settings required to talk to the model and the notifier.
    pub fn validate(&self) -> Result<()> {
        if self.model.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(LuchError::Config(
                "AI_API_KEY not set. Set it with: export AI_API_KEY='...'".to_string(),
            ));
        }

        if self.notify.topic.as_deref().map_or(true, str::is_empty) {
            return Err(LuchError::Config(
                "NTFY_TOPIC not set. Set it with: export NTFY_TOPIC='my-topic'".to_string(),
            ));
        }

        url::Url::parse(&self.notify.server).map_err(|e| {
            LuchError::Config(format!(
                "invalid notification server '{}': {}",
                self.notify.server, e
            ))
        })?;

        if let Some(base_url) = &self.model.base_url {
            url::Url::parse(base_url).map_err(|e| {
                LuchError::Config(format!("invalid model base URL '{}': {}", base_url, e))
            })?;
        }

        if self.model.max_rounds == 0 {
            return Err(LuchError::Config("model.max_rounds must be at least 1".to_string()));
        }

        if self.model.round_timeout_secs == 0 {
            return Err(LuchError::Config(
                "model.round_timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| LuchError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    ///
    /// `./luch.toml` wins when present, otherwise the user config directory.
    pub fn default_config_path() -> PathBuf {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("luch")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded log directory, if file logging is enabled.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.general.log_dir.as_deref().map(Self::expand_path)
    }

    /// Get the expanded custom system prompt path.
    pub fn system_prompt_path(&self) -> Option<PathBuf> {
        self.prompts.system_prompt_file.as_deref().map(Self::expand_path)
    }
}

/// Turn the outcome of loading `.env` into a settings error, ignoring a missing file.
fn check_dotenv(loaded: std::result::Result<PathBuf, dotenvy::Error>) -> Result<()> {
    match loaded {
        Ok(path) => {
            debug!("Loaded environment from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(LuchError::Config(format!("failed to load .env: {}", e))),
    }
}
