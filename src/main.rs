//! Luch CLI entry point.

use anyhow::Result;
use clap::Parser;
use luch::cli::{commands, Cli, Commands, ConfigAction};
use luch::config::Settings;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration; `config init` may target a file that does not exist yet
    let config_path = cli.config.as_deref().map(PathBuf::from);
    let settings = match &cli.command {
        Commands::Config {
            action: ConfigAction::Init { .. },
        } => Settings::default(),
        _ => Settings::load_from(config_path.as_ref())?,
    };

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = luch::logging::init(cli.verbose, &settings)?;

    // Execute command
    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Chat => {
            commands::run_chat(settings).await?;
        }

        Commands::Ask { message } => {
            commands::run_ask(message, settings).await?;
        }

        Commands::Products {
            name,
            min_price,
            max_price,
        } => {
            commands::run_products(name.clone(), *min_price, *max_price, &settings)?;
        }

        Commands::Notify { title, message } => {
            commands::run_notify(title, message, &settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path.as_ref(), settings)?;
        }
    }

    Ok(())
}
