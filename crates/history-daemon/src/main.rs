//! Engine History Importer
//!
//! Imports engine history records into store documents.
//!
//! # Usage
//!
//! ```bash
//! history-importer import --input DIR --output DIR [--engine ALIAS] [--page-size N]
//! history-importer config
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/history-importer/config.toml)
//! 3. Environment variables (HISTORY_*)
//! 4. CLI flags

use anyhow::Result;

use history_daemon::{handle_import, show_config, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Import {
            input,
            output,
            engine,
            page_size,
        } => {
            handle_import(
                cli.config.as_deref(),
                cli.log_level.as_deref(),
                &input,
                &output,
                engine.as_deref(),
                page_size,
            )
            .await?;
        }
        Commands::Config => {
            show_config(cli.config.as_deref())?;
        }
    }

    Ok(())
}
