//! Configuration module for Luch.
//!
//! Handles loading application settings and the system prompt template.

mod prompts;
mod settings;

pub use prompts::{SystemPrompt, DEFAULT_SYSTEM_PROMPT};
pub use settings::{
    AgentSettings, GeneralSettings, ModelSettings, NotifySettings, PromptSettings,
    ServerSettings, Settings, SourceSettings, UiSettings, UiTheme,
};
