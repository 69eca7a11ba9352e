//! LinkSync - hard-link preserving file synchronization
//!
//! Detects which files of a batch are hard links of one another on the
//! source (same device and inode), transfers their content once, and
//! recreates the links on the destination.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod hardlink;
pub mod logging;
pub mod progress;
pub mod report;
pub mod sync;

use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::batch::walker::{Walker, WalkerConfig};
use crate::cli::{Cli, Commands, OutputFormat, ScanArgs, SyncArgs};
use crate::config::Config;
use crate::error::ExitCode;
use crate::hardlink::IdentityIndex;
use crate::progress::Progress;
use crate::report::ScanReport;
use crate::sync::Syncer;

/// Run the application for parsed CLI arguments.
///
/// # Errors
///
/// Returns an error for configuration problems, an unreadable source, an
/// uncreatable destination, or a failure writing the report.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    log::debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Scan(args) => run_scan(&args, config),
        Commands::Sync(args) => run_sync(&args, config, cli.quiet),
    }
}

fn run_scan(args: &ScanArgs, mut config: Config) -> Result<ExitCode> {
    config.apply_scan_args(args);

    let walker = Walker::new(
        &args.source,
        WalkerConfig {
            follow_symlinks: config.follow_symlinks,
            skip_hidden: args.skip_hidden,
        },
    );
    walker.validate_root()?;
    let list = walker.collect_list();
    let index = IdentityIndex::build(&list);
    let report = ScanReport::from_index(&index);

    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Text => report.write_text(&mut stdout)?,
        OutputFormat::Json => writeln!(stdout, "{}", report.to_json()?)?,
    }
    Ok(ExitCode::Success)
}

fn run_sync(args: &SyncArgs, mut config: Config, quiet: bool) -> Result<ExitCode> {
    config.apply_sync_args(args);

    let syncer = Syncer::new(&args.source, &args.dest, &config).skip_hidden(args.skip_hidden);
    let syncer = if config.progress && !config.dry_run {
        syncer.with_progress(Box::new(Progress::new(quiet)))
    } else {
        syncer
    };

    let summary = syncer.run().with_context(|| {
        format!(
            "Failed to sync {} to {}",
            args.source.display(),
            args.dest.display()
        )
    })?;

    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Text => {
            if !quiet {
                report::write_sync_summary(&summary, &mut stdout)?;
            }
        }
        OutputFormat::Json => writeln!(stdout, "{}", serde_json::to_string_pretty(&summary)?)?,
    }
    Ok(summary.exit_code())
}
