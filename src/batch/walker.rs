//! Source tree enumeration using walkdir.
//!
//! # Overview
//!
//! The [`Walker`] turns a directory tree into a [`FileList`] of regular
//! files. Each entry gets a name relative to the root and, on Unix, the
//! device/inode identity needed for hard-link detection. Unlike a duplicate
//! scanner, hard links are *kept*: every name is a separate entry so the
//! link relationships can be rebuilt on the destination.
//!
//! # Example
//!
//! ```no_run
//! use linksync::batch::walker::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/srv/data"), WalkerConfig::default());
//! let list = walker.collect_list();
//! println!("Found {} files", list.len());
//! ```

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{FileEntry, FileList, InodeKey, ScanError};

/// Configuration for source enumeration.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

/// Deterministic directory walker.
#[derive(Debug)]
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given root.
    #[must_use]
    pub fn new(root: &Path, config: WalkerConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
        }
    }

    /// Verify that the root exists and is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotFound`] or [`ScanError::NotADirectory`].
    pub fn validate_root(&self) -> Result<(), ScanError> {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ScanError::NotADirectory(self.root.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ScanError::NotFound(self.root.clone()))
            }
            Err(e) => Err(ScanError::Io {
                path: self.root.clone(),
                source: e,
            }),
        }
    }

    /// Walk the tree, yielding one entry per regular file.
    ///
    /// Errors are yielded rather than stopping iteration. Entries come out
    /// sorted by file name within each directory.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let skip_hidden = self.config.skip_hidden;
        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| e.depth() == 0 || !(skip_hidden && is_hidden(e.file_name())))
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if entry.depth() == 0 || entry.file_type().is_dir() {
                        return None;
                    }
                    if entry.path_is_symlink() && !self.config.follow_symlinks {
                        log::trace!("Skipping symlink: {}", entry.path().display());
                        return None;
                    }
                    match entry.metadata() {
                        Ok(metadata) if metadata.is_file() => {
                            Some(Ok(self.make_entry(entry.path(), &metadata)))
                        }
                        Ok(_) => None,
                        Err(e) => {
                            let path = entry.path().to_path_buf();
                            log::warn!("Cannot stat {}: {}", path.display(), e);
                            Some(Err(ScanError::Io {
                                path,
                                source: e.into(),
                            }))
                        }
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    Some(Err(ScanError::Io {
                        path,
                        source: e.into(),
                    }))
                }
            })
    }

    /// Walk the tree and collect every readable file into a [`FileList`].
    ///
    /// Unreadable entries are logged and left out.
    #[must_use]
    pub fn collect_list(&self) -> FileList {
        self.walk().filter_map(Result::ok).collect()
    }

    fn make_entry(&self, path: &Path, metadata: &Metadata) -> FileEntry {
        let relative = path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();
        FileEntry {
            path: Some(relative),
            identity: InodeKey::from_metadata(metadata),
            size: metadata.len(),
            modified: metadata.modified().ok(),
            mode: file_mode(metadata),
        }
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

#[cfg(unix)]
fn file_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn file_mode(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
