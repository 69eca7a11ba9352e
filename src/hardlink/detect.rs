//! Duplicate classification against the identity index.

use std::cmp::Ordering;

use super::index::{identity_compare, IdentityIndex};
use crate::batch::FileEntry;

impl<'a> IdentityIndex<'a> {
    /// Check whether `entry` should be skipped because it is a hard link
    /// to an earlier entry of the batch.
    ///
    /// Returns `false` for representatives, for entries without identity
    /// data, for entries not present in the index, and whenever the index
    /// is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use linksync::batch::{FileEntry, FileList, InodeKey};
    /// use linksync::hardlink::IdentityIndex;
    ///
    /// let list = FileList::from(vec![
    ///     FileEntry::with_identity("a", InodeKey::new(1, 5)),
    ///     FileEntry::with_identity("b", InodeKey::new(1, 5)),
    /// ]);
    /// let index = IdentityIndex::build(&list);
    ///
    /// assert!(!index.is_duplicate(list.get(0).unwrap()));
    /// assert!(index.is_duplicate(list.get(1).unwrap()));
    /// ```
    #[must_use]
    pub fn is_duplicate(&self, entry: &FileEntry) -> bool {
        match self.predecessor_of(entry) {
            Some((pos, earlier)) => {
                log::trace!(
                    "\"{}\" is a hard link to file {}, \"{}\"",
                    entry.display_name(),
                    pos,
                    earlier.display_name()
                );
                true
            }
            None => false,
        }
    }

    /// The earlier entry `entry` should be linked to, if it is a duplicate.
    #[must_use]
    pub fn representative_of(&self, entry: &FileEntry) -> Option<&'a FileEntry> {
        self.predecessor_of(entry).map(|(_, earlier)| earlier)
    }

    /// Locate `entry` and return the preceding index slot when it shares
    /// the same identity.
    fn predecessor_of(&self, entry: &FileEntry) -> Option<(usize, &'a FileEntry)> {
        let slots = self.as_slice();
        if slots.is_empty() || !entry.has_identity_data() {
            return None;
        }

        let low = converge(slots, entry);

        // Convergence alone does not imply a match when `entry` is absent.
        if identity_compare(slots[low], entry) != Ordering::Equal {
            return None;
        }

        if low > 0 && slots[low - 1].same_identity(entry) {
            return Some((low - 1, slots[low - 1]));
        }
        None
    }
}

/// Binary search that stops on the first exact hit or when the range
/// collapses to one slot.
fn converge(slots: &[&FileEntry], entry: &FileEntry) -> usize {
    let mut low = 0;
    let mut high = slots.len() - 1;

    while low != high {
        let mid = (low + high) / 2;
        match identity_compare(slots[mid], entry) {
            Ordering::Equal => {
                low = mid;
                break;
            }
            Ordering::Greater => high = mid,
            Ordering::Less => low = mid + 1,
        }
    }
    low
}

#[cfg(test)]
mod tests {
    use crate::batch::{FileEntry, FileList, InodeKey};
    use crate::hardlink::IdentityIndex;

    fn entry(name: &str, dev: u64, ino: u64) -> FileEntry {
        FileEntry::with_identity(name, InodeKey::new(dev, ino))
    }

    fn scenario() -> FileList {
        FileList::from(vec![
            entry("A", 1, 5),
            entry("B", 1, 5),
            entry("C", 1, 5),
            entry("D", 2, 9),
        ])
    }

    #[test]
    fn test_scenario_classification() {
        let list = scenario();
        let index = IdentityIndex::build(&list);

        let flags: Vec<_> = list.iter().map(|e| index.is_duplicate(e)).collect();
        assert_eq!(flags, vec![false, true, true, false]);
    }

    #[test]
    fn test_representative_of_points_at_predecessor() {
        let list = scenario();
        let index = IdentityIndex::build(&list);

        assert!(index.representative_of(list.get(0).unwrap()).is_none());
        assert_eq!(
            index.representative_of(list.get(1).unwrap()).unwrap().display_name(),
            "A"
        );
        assert_eq!(
            index.representative_of(list.get(2).unwrap()).unwrap().display_name(),
            "B"
        );
    }

    #[test]
    fn test_empty_index_never_duplicate() {
        let list = FileList::new();
        let index = IdentityIndex::build(&list);
        assert!(!index.is_duplicate(&entry("A", 1, 5)));
    }

    #[test]
    fn test_entry_without_identity_never_duplicate() {
        let list = scenario();
        let index = IdentityIndex::build(&list);
        assert!(!index.is_duplicate(&FileEntry::new("B")));
    }

    #[test]
    fn test_index_of_one_slot() {
        // Two entries, one carrying identity: index has a single slot.
        let list = FileList::from(vec![entry("A", 1, 5), FileEntry::new("B")]);
        let index = IdentityIndex::build(&list);
        assert_eq!(index.len(), 1);

        assert!(!index.is_duplicate(list.get(0).unwrap()));
        assert!(!index.is_duplicate(&entry("Z", 1, 5)));
        assert!(!index.is_duplicate(&entry("A", 0, 0)));
        assert!(!index.is_duplicate(&entry("A", 9, 9)));
    }

    #[test]
    fn test_absent_entry_sharing_identity_is_not_duplicate() {
        let list = scenario();
        let index = IdentityIndex::build(&list);

        // Same identity as A/B/C but a name the index never saw.
        assert!(!index.is_duplicate(&entry("BB", 1, 5)));
        assert!(!index.is_duplicate(&entry("ZZ", 1, 5)));
        assert!(!index.is_duplicate(&entry("0", 1, 5)));
    }

    #[test]
    fn test_absent_identity_at_boundaries() {
        let list = scenario();
        let index = IdentityIndex::build(&list);

        assert!(!index.is_duplicate(&entry("A", 0, 0)));
        assert!(!index.is_duplicate(&entry("D", 9, 9)));
        assert!(!index.is_duplicate(&entry("M", 1, 7)));
    }

    #[test]
    fn test_singletons_are_representatives() {
        let list = FileList::from(vec![entry("a", 1, 1), entry("b", 1, 2), entry("c", 1, 3)]);
        let index = IdentityIndex::build(&list);
        assert!(list.iter().all(|e| !index.is_duplicate(e)));
    }

    #[test]
    fn test_large_group_every_member_but_first() {
        let list: FileList = (0..50).map(|i| entry(&format!("f{i:02}"), 7, 7)).collect();
        let index = IdentityIndex::build(&list);

        let duplicates = list.iter().filter(|e| index.is_duplicate(e)).count();
        assert_eq!(duplicates, 49);
        assert!(!index.is_duplicate(list.get(0).unwrap()));
    }
}
