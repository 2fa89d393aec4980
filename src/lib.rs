//! Luch - Conversational Sales and Support Agent
//!
//! A customer-facing chat agent that answers questions about a company's
//! products and services, and alerts the team when a user shares contact
//! details or something else worth their attention.
//!
//! The name "Luch" comes from the Russian word for "ray."
//!
//! # Overview
//!
//! Luch allows you to:
//! - Serve a web chat widget backed by an OpenAI-compatible model
//! - Ground answers in a product table, a product document and company text
//! - Let the model look up products by name and price range
//! - Push notifications to the team through ntfy
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and system prompt
//! - `knowledge` - Product records and reference text
//! - `notify` - Team notifications
//! - `agent` - Tool definitions and the tool calling loop
//! - `openai` - Chat model client
//! - `orchestrator` - Component wiring
//! - `cli` - Command line interface and web server
//!
//! # Example
//!
//! ```rust,no_run
//! use luch::config::Settings;
//! use luch::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let response = orchestrator.respond("Do you have anything under 30?", &[]).await?;
//!     println!("{}", response.content);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod logging;
pub mod notify;
pub mod openai;
pub mod orchestrator;

pub use error::{LuchError, Result};
