//! Local tree synchronization driver.
//!
//! # Overview
//!
//! [`Syncer`] runs one batch end to end:
//!
//! 1. Enumerate the source tree into a [`FileList`].
//! 2. Build the [`IdentityIndex`] (unless hard-link preservation is off).
//! 3. Copy every entry the index does not classify as a duplicate.
//! 4. Materialize the hard links on the destination.
//!
//! In dry-run mode steps 3 and 4 only log what they would do; nothing on
//! the destination is touched.
//!
//! # Example
//!
//! ```no_run
//! use linksync::config::Config;
//! use linksync::sync::Syncer;
//! use std::path::Path;
//!
//! let config = Config::default();
//! let summary = Syncer::new(Path::new("/src"), Path::new("/dst"), &config)
//!     .run()
//!     .unwrap();
//! println!("{} copied, {} linked", summary.copied, summary.links.created);
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::batch::walker::{Walker, WalkerConfig};
use crate::batch::{FileEntry, FileList, ScanError};
use crate::config::Config;
use crate::error::ExitCode;
use crate::hardlink::{materialize_links, IdentityIndex, IndexStats, LinkStats, LinkTarget, SystemFs};
use crate::progress::{NoProgress, ProgressCallback};

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The source tree could not be enumerated.
    #[error(transparent)]
    Source(#[from] ScanError),

    /// The destination root could not be created.
    #[error("cannot create destination {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Error copying a single file; logged and counted, never fatal.
#[derive(Debug, Error)]
#[error("copy {from} -> {to}: {source}")]
pub struct CopyError {
    pub from: PathBuf,
    pub to: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncSummary {
    /// Entries in the batch
    pub files: usize,
    /// Entries whose data was copied (or would be, in a dry run)
    pub copied: usize,
    /// Bytes copied
    pub bytes_copied: u64,
    /// Entries left to the link pass instead of being copied
    pub duplicates: usize,
    /// Entries whose copy failed
    pub copy_failures: usize,
    /// Identity index counts
    pub index: IndexStats,
    /// Link materialization counts
    pub links: LinkStats,
    /// Whether this was a dry run
    pub dry_run: bool,
}

impl SyncSummary {
    /// Exit code reflecting per-file failures.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.copy_failures > 0 || !self.links.is_clean() {
            ExitCode::PartialSuccess
        } else {
            ExitCode::Success
        }
    }
}

/// Copies one source tree to a destination, preserving hard links.
pub struct Syncer<'a> {
    source: PathBuf,
    dest: PathBuf,
    config: &'a Config,
    skip_hidden: bool,
    progress: Box<dyn ProgressCallback + 'a>,
}

impl<'a> Syncer<'a> {
    /// Create a syncer from `source` into `dest`.
    #[must_use]
    pub fn new(source: &Path, dest: &Path, config: &'a Config) -> Self {
        Self {
            source: source.to_path_buf(),
            dest: dest.to_path_buf(),
            config,
            skip_hidden: false,
            progress: Box::new(NoProgress),
        }
    }

    /// Report copy progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Box<dyn ProgressCallback + 'a>) -> Self {
        self.progress = progress;
        self
    }

    /// Leave out hidden files and directories.
    #[must_use]
    pub fn skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Enumerate the source and synchronize it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the source is not a readable directory or
    /// the destination root cannot be created. Per-file failures are
    /// reported in the summary instead.
    pub fn run(&self) -> Result<SyncSummary, SyncError> {
        let walker = Walker::new(
            &self.source,
            WalkerConfig {
                follow_symlinks: self.config.follow_symlinks,
                skip_hidden: self.skip_hidden,
            },
        );
        walker.validate_root()?;
        let list = walker.collect_list();
        log::info!(
            "Found {} files in {}",
            list.len(),
            self.source.display()
        );
        self.sync_list(&list)
    }

    /// Synchronize an already enumerated batch.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Destination`] if the destination root cannot
    /// be created.
    pub fn sync_list(&self, list: &FileList) -> Result<SyncSummary, SyncError> {
        let dry_run = self.config.dry_run;
        let mut summary = SyncSummary {
            files: list.len(),
            dry_run,
            ..SyncSummary::default()
        };

        let index = if self.config.preserve_hard_links {
            IdentityIndex::build(list)
        } else {
            IdentityIndex::default()
        };
        summary.index = index.stats();

        if !dry_run {
            fs::create_dir_all(&self.dest).map_err(|source| SyncError::Destination {
                path: self.dest.clone(),
                source,
            })?;
        }

        self.progress.on_phase_start("copy", list.len());
        for (i, entry) in list.iter().enumerate() {
            self.progress.on_progress(i + 1, &entry.display_name());

            if index.is_duplicate(entry) {
                summary.duplicates += 1;
                let representative = index
                    .representative_of(entry)
                    .map_or_else(String::new, FileEntry::display_name);
                if dry_run {
                    log::info!("would link {} => {}", entry.display_name(), representative);
                } else {
                    log::debug!("{} will be linked to {}", entry.display_name(), representative);
                    if let Some(name) = entry.name() {
                        self.create_parent(name);
                    }
                }
                continue;
            }
            let Some(name) = entry.name() else {
                continue;
            };

            if dry_run {
                log::info!("would copy {}", name.display());
                summary.copied += 1;
                continue;
            }

            match self.copy_entry(name, entry) {
                Ok(bytes) => {
                    summary.copied += 1;
                    summary.bytes_copied += bytes;
                    self.progress.on_item_completed(bytes);
                }
                Err(e) => {
                    log::warn!("{}", e);
                    summary.copy_failures += 1;
                }
            }
        }
        self.progress.on_phase_end("copy");

        if !dry_run && !index.is_empty() {
            let fs_ops = SystemFs::new(self.config.follow_symlinks);
            summary.links = materialize_links(&index, &LinkTarget::new(&self.dest), &fs_ops);
        }

        Ok(summary)
    }

    /// Make sure the directory a link will be created in exists, even when
    /// no file in it is copied.
    fn create_parent(&self, name: &Path) {
        let to = self.dest.join(name);
        if let Some(parent) = to.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("cannot create {}: {}", parent.display(), e);
            }
        }
    }

    /// Copy one entry through a temporary sibling so an existing
    /// destination file (possibly linked elsewhere) is replaced, not
    /// overwritten in place.
    fn copy_entry(&self, name: &Path, entry: &FileEntry) -> Result<u64, CopyError> {
        let from = self.source.join(name);
        let to = self.dest.join(name);
        let wrap = |source| CopyError {
            from: from.clone(),
            to: to.clone(),
            source,
        };

        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }

        let tmp = temp_sibling(&to);
        let bytes = match fs::copy(&from, &tmp).and_then(|n| fs::rename(&tmp, &to).map(|()| n)) {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                return Err(wrap(e));
            }
        };

        log::trace!("copied {} ({} bytes, expected {})", name.display(), bytes, entry.size);
        Ok(bytes)
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.linksync-tmp", std::process::id()))
}
