//! Hard-link preservation for a file batch.
//!
//! # Overview
//!
//! Files that are hard links of one another on the source share a device
//! and inode number. This module detects them and rebuilds the same
//! relationships on the destination, so their content is transferred once.
//!
//! The lifecycle per batch is:
//!
//! 1. [`IdentityIndex::build`] over the batch.
//! 2. [`IdentityIndex::is_duplicate`] for each entry while planning the
//!    transfer; duplicates are not copied.
//! 3. [`materialize_links`] once the data has been transferred.
//! 4. Drop the index before the next batch.
//!
//! # Example
//!
//! ```no_run
//! use linksync::batch::walker::{Walker, WalkerConfig};
//! use linksync::hardlink::{materialize_links, IdentityIndex, LinkTarget, SystemFs};
//! use std::path::Path;
//!
//! let list = Walker::new(Path::new("/src"), WalkerConfig::default()).collect_list();
//! let index = IdentityIndex::build(&list);
//!
//! for entry in &list {
//!     if index.is_duplicate(entry) {
//!         continue;
//!     }
//!     // copy entry data to /dst ...
//! }
//!
//! let stats = materialize_links(&index, &LinkTarget::new("/dst"), &SystemFs::default());
//! println!("{} links created", stats.created);
//! ```

mod detect;
pub mod fs_ops;
pub mod index;
pub mod materialize;

pub use fs_ops::{FsOps, SystemFs};
pub use index::{identity_compare, IdentityIndex, IndexStats, LinkGroup};
pub use materialize::{
    hard_link_one, materialize_links, LinkError, LinkOutcome, LinkStats, LinkTarget,
};
