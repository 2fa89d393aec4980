//! Error types for Luch.

use thiserror::Error;

/// Library-level error type for Luch operations.
#[derive(Error, Debug)]
pub enum LuchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Knowledge source error: {0}")]
    Source(String),

    #[error("Invalid arguments for tool '{tool}': {source}")]
    ToolArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Tool loop exceeded {rounds} model rounds without a final answer")]
    ToolLoopExceeded { rounds: usize },

    #[error("Model did not respond within {0} seconds")]
    ModelTimeout(u64),

    #[error("Model provider unavailable: {0}")]
    ModelUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

impl LuchError {
    /// Whether the error came from the model provider side of a turn.
    ///
    /// The transport shows the same generic message for all of them.
    pub fn is_model_failure(&self) -> bool {
        matches!(
            self,
            LuchError::ModelUnavailable(_)
                | LuchError::ModelTimeout(_)
                | LuchError::ToolLoopExceeded { .. }
        )
    }
}

/// Result type alias for Luch operations.
pub type Result<T> = std::result::Result<T, LuchError>;
