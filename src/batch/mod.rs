//! File batch model consumed by the hard-link subsystem.
//!
//! # Overview
//!
//! A [`FileList`] is one batch of files being synchronized. Each
//! [`FileEntry`] carries a name relative to the transfer root and, when the
//! platform provided it, the on-disk identity ([`InodeKey`]) used to detect
//! hard links.
//!
//! # Example
//!
//! ```
//! use linksync::batch::{FileEntry, FileList, InodeKey};
//!
//! let list = FileList::from(vec![
//!     FileEntry::with_identity("a.txt", InodeKey::new(1, 5)),
//!     FileEntry::with_identity("b.txt", InodeKey::new(1, 5)),
//!     FileEntry::new("c.txt"),
//! ]);
//!
//! assert_eq!(list.len(), 3);
//! assert!(list.get(0).unwrap().has_identity_data());
//! assert!(!list.get(2).unwrap().has_identity_data());
//! ```

pub mod walker;

use std::cmp::Ordering;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

pub use walker::Walker;

/// On-disk identity of a file: device id plus inode number.
///
/// Two entries with equal keys are the same underlying storage object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct InodeKey {
    /// Device id
    pub dev: u64,
    /// Inode number on that device
    pub ino: u64,
}

impl InodeKey {
    /// Create a key from raw device and inode numbers.
    #[must_use]
    pub const fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    /// Extract the key from file metadata.
    ///
    /// Returns `None` on platforms that do not expose device/inode pairs.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// One file in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Name relative to the transfer root, `None` if it cannot be resolved
    pub path: Option<PathBuf>,
    /// Device/inode identity, present only when identity data was collected
    pub identity: Option<InodeKey>,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: Option<SystemTime>,
    /// Permission and type bits
    pub mode: u32,
}

impl FileEntry {
    /// Create an entry with a name and no identity data.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            identity: None,
            size: 0,
            modified: None,
            mode: 0,
        }
    }

    /// Create an entry with a name and identity data.
    #[must_use]
    pub fn with_identity(path: impl Into<PathBuf>, identity: InodeKey) -> Self {
        Self {
            identity: Some(identity),
            ..Self::new(path)
        }
    }

    /// Set the size, builder style.
    #[must_use]
    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Whether this entry takes part in hard-link detection.
    #[must_use]
    pub fn has_identity_data(&self) -> bool {
        self.identity.is_some()
    }

    /// Relative name of the entry, if resolvable.
    #[must_use]
    pub fn name(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Name for log messages.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.path
            .as_deref()
            .map_or_else(|| "<unnamed>".to_string(), |p| p.display().to_string())
    }

    /// Whether `self` and `other` refer to the same on-disk object.
    #[must_use]
    pub fn same_identity(&self, other: &FileEntry) -> bool {
        match (self.identity, other.identity) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Total order over entries, ignoring identity.
///
/// Unnamed entries sort first, then by path, size, modification time and mode.
#[must_use]
pub fn compare_entries(a: &FileEntry, b: &FileEntry) -> Ordering {
    a.path
        .cmp(&b.path)
        .then_with(|| a.size.cmp(&b.size))
        .then_with(|| a.modified.cmp(&b.modified))
        .then_with(|| a.mode.cmp(&b.mode))
}

/// A batch of file entries, in enumeration order.
#[derive(Debug, Clone, Default)]
pub struct FileList {
    entries: Vec<FileEntry>,
}

impl FileList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, entry: FileEntry) {
        self.entries.push(entry);
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at position `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FileEntry> {
        self.entries.get(index)
    }

    /// Iterate entries in enumeration order.
    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }
}

impl From<Vec<FileEntry>> for FileList {
    fn from(entries: Vec<FileEntry>) -> Self {
        Self { entries }
    }
}

impl FromIterator<FileEntry> for FileList {
    fn from_iter<I: IntoIterator<Item = FileEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FileList {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Errors that can occur while enumerating a source tree.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
