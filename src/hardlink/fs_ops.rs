//! Filesystem primitives used to materialize links.
//!
//! [`FsOps`] is the seam between the materializer and the real filesystem.
//! [`SystemFs`] is the production implementation; tests substitute their
//! own to observe or inject failures.

use std::io;
use std::path::Path;

use crate::batch::InodeKey;

/// Filesystem operations needed by the link materializer.
pub trait FsOps {
    /// Identity of the object at `path`.
    ///
    /// # Errors
    ///
    /// Any error from the underlying stat call, including `NotFound`.
    fn stat(&self, path: &Path) -> io::Result<InodeKey>;

    /// Create `link` as a hard link to `original`.
    ///
    /// # Errors
    ///
    /// Any error from the underlying link call.
    fn link(&self, original: &Path, link: &Path) -> io::Result<()>;

    /// Remove `path`, treating an already missing file as success.
    ///
    /// # Errors
    ///
    /// Any removal error other than `NotFound`.
    fn robust_unlink(&self, path: &Path) -> io::Result<()>;
}

/// Real filesystem access through `std::fs`.
///
/// The stat variant (following symlinks or not) is fixed at construction
/// and used for every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFs {
    follow_symlinks: bool,
}

impl SystemFs {
    /// Create a filesystem handle.
    ///
    /// # Arguments
    ///
    /// * `follow_symlinks` - Use `stat` instead of `lstat`
    #[must_use]
    pub const fn new(follow_symlinks: bool) -> Self {
        Self { follow_symlinks }
    }
}

impl FsOps for SystemFs {
    fn stat(&self, path: &Path) -> io::Result<InodeKey> {
        let metadata = if self.follow_symlinks {
            std::fs::metadata(path)?
        } else {
            std::fs::symlink_metadata(path)?
        };
        InodeKey::from_metadata(&metadata).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::Unsupported,
                "device/inode identity is not available on this platform",
            )
        })
    }

    fn link(&self, original: &Path, link: &Path) -> io::Result<()> {
        std::fs::hard_link(original, link)
    }

    fn robust_unlink(&self, path: &Path) -> io::Result<()> {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("{} already removed", path.display());
                Ok(())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_robust_unlink_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let fs_ops = SystemFs::default();
        assert!(fs_ops.robust_unlink(&dir.path().join("gone")).is_ok());
    }

    #[test]
    fn test_robust_unlink_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f");
        fs::write(&path, "x").unwrap();

        SystemFs::default().robust_unlink(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_robust_unlink_directory_fails() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        assert!(SystemFs::default().robust_unlink(&sub).is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_stat_and_link() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("original");
        let link = dir.path().join("link");
        fs::write(&original, "x").unwrap();

        let fs_ops = SystemFs::new(false);
        fs_ops.link(&original, &link).unwrap();
        assert_eq!(fs_ops.stat(&original).unwrap(), fs_ops.stat(&link).unwrap());
    }

    #[test]
    fn test_stat_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = SystemFs::default().stat(&dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    #[cfg(unix)]
    fn test_stat_variant_on_symlink() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        let symlink = dir.path().join("symlink");
        fs::write(&target, "x").unwrap();
        std::os::unix::fs::symlink(&target, &symlink).unwrap();

        let follow = SystemFs::new(true);
        let no_follow = SystemFs::new(false);
        assert_eq!(follow.stat(&symlink).unwrap(), follow.stat(&target).unwrap());
        assert_ne!(
            no_follow.stat(&symlink).unwrap(),
            no_follow.stat(&target).unwrap()
        );
    }
}
