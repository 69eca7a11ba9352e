//! Recreate source hard links on the destination.
//!
//! # Overview
//!
//! After the data of every representative has been transferred, each later
//! member of an identity group is turned into a hard link of the entry just
//! before it in the index. Since earlier pairs are fixed first, every
//! member ends up sharing the representative's inode.
//!
//! Per pair:
//!
//! 1. The representative's destination must exist, otherwise the pair is
//!    skipped.
//! 2. A missing duplicate is linked directly.
//! 3. An existing duplicate already on the right inode is left alone; any
//!    other file there is removed and replaced by the link.
//!
//! Failures are logged and counted; they never stop the batch.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use super::fs_ops::FsOps;
use super::index::IdentityIndex;
use crate::batch::FileEntry;

/// Error while fixing up one link pair.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The file occupying the duplicate's path could not be removed.
    #[error("unlink {path}: {source}")]
    Unlink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The hard link could not be created.
    #[error("link {link} => {original} : {source}")]
    Link {
        original: PathBuf,
        link: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LinkError {
    /// Destination path the failed operation targeted.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Unlink { path, .. } => path,
            Self::Link { link, .. } => link,
        }
    }
}

/// Result of one successfully processed pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A new link was created.
    Created,
    /// The destination already shared the representative's inode.
    AlreadyLinked,
    /// The representative's destination does not exist.
    MissingRepresentative,
}

/// Counters for one materialization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Links created
    pub created: usize,
    /// Pairs already linked on the destination
    pub already_linked: usize,
    /// Pairs skipped because the representative was missing
    pub skipped_missing: usize,
    /// Pairs abandoned after an unlink or link failure
    pub failed: usize,
}

impl LinkStats {
    /// Total pairs examined.
    #[must_use]
    pub fn pairs(&self) -> usize {
        self.created + self.already_linked + self.skipped_missing + self.failed
    }

    /// Whether no pair failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, outcome: LinkOutcome) {
        match outcome {
            LinkOutcome::Created => self.created += 1,
            LinkOutcome::AlreadyLinked => self.already_linked += 1,
            LinkOutcome::MissingRepresentative => self.skipped_missing += 1,
        }
    }
}

/// Maps batch entries to their paths on the destination.
#[derive(Debug, Clone)]
pub struct LinkTarget {
    root: PathBuf,
}

impl LinkTarget {
    /// Resolve names under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Destination path of `entry`, if it has a name.
    #[must_use]
    pub fn resolve(&self, entry: &FileEntry) -> Option<PathBuf> {
        entry.name().map(|name| self.root.join(name))
    }
}

/// Create hard links on the destination for every identity group in
/// `index`.
///
/// Must be called once per batch, after all data has been transferred.
/// Callers honoring a dry run must not call this at all.
pub fn materialize_links<F: FsOps + ?Sized>(
    index: &IdentityIndex<'_>,
    target: &LinkTarget,
    fs: &F,
) -> LinkStats {
    let mut stats = LinkStats::default();
    if index.is_empty() {
        return stats;
    }

    for pair in index.as_slice().windows(2) {
        let (earlier, later) = (pair[0], pair[1]);
        if !later.same_identity(earlier) {
            continue;
        }
        let (Some(original), Some(link)) = (target.resolve(earlier), target.resolve(later)) else {
            continue;
        };

        match hard_link_one(fs, &original, &link) {
            Ok(outcome) => stats.record(outcome),
            Err(e) => {
                log::warn!("{}", e);
                stats.failed += 1;
            }
        }
    }

    log::debug!(
        "Hard links: {} created, {} already linked, {} skipped, {} failed",
        stats.created,
        stats.already_linked,
        stats.skipped_missing,
        stats.failed
    );
    stats
}

/// Make `link` a hard link of `original`.
///
/// # Errors
///
/// Returns [`LinkError`] when removing an existing file or creating the
/// link fails.
pub fn hard_link_one<F: FsOps + ?Sized>(
    fs: &F,
    original: &Path,
    link: &Path,
) -> Result<LinkOutcome, LinkError> {
    let Ok(original_key) = fs.stat(original) else {
        log::debug!(
            "Skipping {}: {} is missing",
            link.display(),
            original.display()
        );
        return Ok(LinkOutcome::MissingRepresentative);
    };

    match fs.stat(link) {
        Ok(key) if key == original_key => {
            log::debug!("{} is already linked to {}", link.display(), original.display());
            return Ok(LinkOutcome::AlreadyLinked);
        }
        Ok(_) => fs.robust_unlink(link).map_err(|source| LinkError::Unlink {
            path: link.to_path_buf(),
            source,
        })?,
        Err(_) => {}
    }

    fs.link(original, link).map_err(|source| LinkError::Link {
        original: original.to_path_buf(),
        link: link.to_path_buf(),
        source,
    })?;

    log::info!("{} => {}", link.display(), original.display());
    Ok(LinkOutcome::Created)
}
