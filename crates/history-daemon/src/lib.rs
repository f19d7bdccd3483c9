//! History importer library exports.
//!
//! This crate provides the command-line driver for the history import
//! pipeline.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (import, config)
//! - `fixtures`: File-backed engine records and engine client
//! - `sink`: JSON-lines document writer and cursor handle

pub mod cli;
pub mod commands;
pub mod fixtures;
pub mod sink;

pub use cli::{Cli, Commands};
pub use commands::{handle_import, into_pages, run_import, show_config, EntityReport, ImportSummary};
pub use fixtures::{FixtureEngineClient, FixtureSet};
pub use sink::{JsonLinesWriter, LoggingCursor};
