//! Text and JSON rendering of hard-link groups and sync summaries.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "groups": [
//!     { "dev": 2049, "ino": 131, "files": ["a.txt", "sub/b.txt"] }
//!   ],
//!   "summary": { "indexed": 3, "groups": 1, "duplicates": 1 }
//! }
//! ```

use std::io::{self, Write};

use serde::Serialize;

use crate::hardlink::{IdentityIndex, IndexStats};
use crate::sync::SyncSummary;

/// A single hard-link group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonLinkGroup {
    /// Device id shared by the group
    pub dev: u64,
    /// Inode number shared by the group
    pub ino: u64,
    /// Names in index order; the first is the representative
    pub files: Vec<String>,
}

/// Scan report.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Groups with two or more names
    pub groups: Vec<JsonLinkGroup>,
    /// Index counts
    pub summary: IndexStats,
}

impl ScanReport {
    /// Collect the groups of `index`.
    #[must_use]
    pub fn from_index(index: &IdentityIndex<'_>) -> Self {
        let groups = index
            .groups()
            .map(|group| JsonLinkGroup {
                dev: group.key.dev,
                ino: group.key.ino,
                files: group.entries.iter().map(|e| e.display_name()).collect(),
            })
            .collect();
        Self {
            groups,
            summary: index.stats(),
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write a human-readable listing.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for group in &self.groups {
            writeln!(out, "[dev {} ino {}]", group.dev, group.ino)?;
            for (i, file) in group.files.iter().enumerate() {
                let marker = if i == 0 { "*" } else { " " };
                writeln!(out, "  {marker} {file}")?;
            }
        }
        writeln!(
            out,
            "{} files with identity data, {} link groups, {} redundant names",
            self.summary.indexed, self.summary.groups, self.summary.duplicates
        )
    }
}

/// Write a human-readable sync summary.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_sync_summary<W: Write>(summary: &SyncSummary, out: &mut W) -> io::Result<()> {
    let prefix = if summary.dry_run { "(dry run) " } else { "" };
    writeln!(
        out,
        "{prefix}{} files: {} copied ({} bytes), {} left for linking, {} copy failures",
        summary.files,
        summary.copied,
        summary.bytes_copied,
        summary.duplicates,
        summary.copy_failures
    )?;
    writeln!(
        out,
        "{prefix}links: {} created, {} already linked, {} skipped, {} failed",
        summary.links.created,
        summary.links.already_linked,
        summary.links.skipped_missing,
        summary.links.failed
    )
}
