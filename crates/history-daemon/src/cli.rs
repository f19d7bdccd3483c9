//! CLI argument parsing for the history importer.
//!
//! CLI flags override all other config sources.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Engine History Importer
///
/// Imports engine history records into store documents.
#[derive(Parser, Debug)]
#[command(name = "history-importer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/history-importer/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Importer commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import history fixtures from a directory
    Import {
        /// Directory with one JSON array file per entity type
        #[arg(short, long)]
        input: PathBuf,

        /// Directory receiving one JSON-lines file per entity type
        #[arg(short, long)]
        output: PathBuf,

        /// Engine alias (default: first enabled engine)
        #[arg(short, long)]
        engine: Option<String>,

        /// Override the page size
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Print the effective configuration
    Config,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
