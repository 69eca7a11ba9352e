//! Command-line interface definitions for LinkSync.
//!
//! This module defines all CLI arguments and subcommands using the clap derive API.
//!
//! # Example
//!
//! ```bash
//! # Show which files in a tree are hard links of each other
//! linksync scan /srv/data
//!
//! # Same, as JSON for scripting
//! linksync scan /srv/data --output json
//!
//! # Copy a tree, recreating hard links instead of duplicating data
//! linksync sync /srv/data /backup/data
//!
//! # See what would happen without touching the destination
//! linksync -v sync /srv/data /backup/data --dry-run
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Preserve hard links when copying file trees.
///
/// LinkSync copies the content of each hard-linked file once and recreates
/// the remaining names as hard links on the destination.
#[derive(Debug, Parser)]
#[command(name = "linksync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file to use instead of the platform default
    #[arg(long, value_name = "PATH", global = true, env = "LINKSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List hard-link groups found in a source tree
    Scan(ScanArgs),
    /// Copy a source tree to a destination, preserving hard links
    Sync(SyncArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Follow symbolic links during scan
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,
}

/// Arguments for the sync subcommand.
#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Directory to copy from
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory to copy into (created if missing)
    #[arg(value_name = "DEST")]
    pub dest: PathBuf,

    /// Report what would be done without writing to the destination
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Copy every name as an independent file
    #[arg(long)]
    pub no_hard_links: bool,

    /// Follow symbolic links when enumerating and when checking the destination
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Output format for the final summary
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
