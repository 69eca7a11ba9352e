//! Sorted identity index over a file batch.
//!
//! The index holds references to every entry that carries identity data,
//! ordered by `(dev, ino)` and then by [`compare_entries`]. Entries that are
//! hard links of one another end up next to each other; the first of each
//! run is the representative.

use std::cmp::Ordering;

use serde::Serialize;

use crate::batch::{compare_entries, FileEntry, FileList, InodeKey};

/// Full ordering used by the index: identity first, then the entry order.
///
/// Both entries must carry identity data. Entries without it compare by
/// the tiebreak alone.
#[must_use]
pub fn identity_compare(a: &FileEntry, b: &FileEntry) -> Ordering {
    a.identity
        .cmp(&b.identity)
        .then_with(|| compare_entries(a, b))
}

/// Ordered, non-owning view of the entries of one batch that carry
/// identity data.
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex<'a> {
    entries: Vec<&'a FileEntry>,
}

/// Summary counts for an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Entries with identity data
    pub indexed: usize,
    /// Identity groups with two or more entries
    pub groups: usize,
    /// Entries that are not the first of their group
    pub duplicates: usize,
}

/// One run of entries sharing an identity.
#[derive(Debug, Clone)]
pub struct LinkGroup<'i, 'a> {
    /// Shared device/inode
    pub key: InodeKey,
    /// Members in index order; the first is the representative
    pub entries: &'i [&'a FileEntry],
}

impl LinkGroup<'_, '_> {
    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; groups are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IdentityIndex<'a> {
    /// Build the index for `batch`.
    ///
    /// Batches with fewer than two entries, or with no entry carrying
    /// identity data, produce an empty index.
    ///
    /// # Example
    ///
    /// ```
    /// use linksync::batch::{FileEntry, FileList, InodeKey};
    /// use linksync::hardlink::IdentityIndex;
    ///
    /// let list = FileList::from(vec![
    ///     FileEntry::with_identity("b", InodeKey::new(1, 5)),
    ///     FileEntry::with_identity("a", InodeKey::new(1, 5)),
    /// ]);
    /// let index = IdentityIndex::build(&list);
    ///
    /// assert_eq!(index.len(), 2);
    /// assert_eq!(index.get(0).unwrap().display_name(), "a");
    /// ```
    #[must_use]
    pub fn build(batch: &'a FileList) -> Self {
        if batch.len() < 2 {
            return Self::default();
        }

        let mut entries: Vec<&'a FileEntry> = Vec::with_capacity(batch.len());
        entries.extend(batch.iter().filter(|e| e.has_identity_data()));

        if entries.is_empty() {
            log::debug!("No entries with identity data in batch of {}", batch.len());
            return Self::default();
        }

        entries.sort_by(|a, b| identity_compare(a, b));
        entries.shrink_to_fit();

        log::debug!(
            "Built identity index: {} of {} entries",
            entries.len(),
            batch.len()
        );
        Self { entries }
    }

    /// Replace this index with one built from `batch`.
    ///
    /// The previous storage is released before the new index is built.
    pub fn rebuild(&mut self, batch: &'a FileList) {
        self.entries = Vec::new();
        *self = Self::build(batch);
    }

    /// Number of indexed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at index position `pos`.
    #[must_use]
    pub fn get(&self, pos: usize) -> Option<&'a FileEntry> {
        self.entries.get(pos).copied()
    }

    /// Entries in index order.
    #[must_use]
    pub fn as_slice(&self) -> &[&'a FileEntry] {
        &self.entries
    }

    /// Iterate over identity groups with at least two members.
    pub fn groups(&self) -> impl Iterator<Item = LinkGroup<'_, 'a>> + '_ {
        self.entries
            .chunk_by(|a, b| a.identity == b.identity)
            .filter(|run| run.len() > 1)
            .filter_map(|run| {
                run[0].identity.map(|key| LinkGroup { key, entries: run })
            })
    }

    /// Summary counts.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            indexed: self.entries.len(),
            ..IndexStats::default()
        };
        for group in self.groups() {
            stats.groups += 1;
            stats.duplicates += group.len() - 1;
        }
        stats
    }
}
