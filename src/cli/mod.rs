//! CLI module for Luch.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Luch - Conversational Sales and Support Agent
///
/// Answers customer questions about your products and services, and
/// notifies your team when someone wants to be contacted.
#[derive(Parser, Debug)]
#[command(name = "luch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web chat widget
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start an interactive chat session in the terminal
    Chat,

    /// Send a single message and print the reply
    Ask {
        /// The message to send
        message: String,
    },

    /// Look up products the same way the agent does
    Products {
        /// Case-insensitive part of the product name
        #[arg(short, long)]
        name: Option<String>,

        /// Only products priced above this
        #[arg(long)]
        min_price: Option<f64>,

        /// Only products priced below this
        #[arg(long)]
        max_price: Option<f64>,
    },

    /// Send a test notification to the team
    Notify {
        /// Notification title
        title: String,

        /// Notification body
        message: String,
    },

    /// Check configuration and knowledge sources
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
