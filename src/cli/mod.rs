//! CLI module - Command-line interface for Mesa
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mesa - tabletop group coordination API
#[derive(Parser)]
#[command(name = "mesa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config.toml (default: search ./, the user config dir, ~/.mesa)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Apply migrations and run the HTTP API (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Delete expired API tokens and password reset tokens
    Prune,
}

pub use commands::*;
