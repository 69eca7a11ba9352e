//! End-to-end synchronization of real directory trees.

use linksync::config::Config;
use linksync::error::ExitCode;
use linksync::sync::Syncer;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn quiet_config() -> Config {
    Config {
        progress: false,
        ..Config::default()
    }
}

#[cfg(unix)]
fn inode(path: &Path) -> (u64, u64) {
    use std::os::unix::fs::MetadataExt;
    let meta = fs::symlink_metadata(path).unwrap();
    (meta.dev(), meta.ino())
}

/// Source tree with one three-name link group and one plain file.
fn create_source() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("a.txt"), "shared content").unwrap();
    fs::hard_link(dir.path().join("a.txt"), dir.path().join("b.txt")).unwrap();
    fs::hard_link(dir.path().join("a.txt"), dir.path().join("sub/c.txt")).unwrap();
    fs::write(dir.path().join("plain.txt"), "plain").unwrap();
    dir
}

#[test]
#[cfg(unix)]
fn test_sync_recreates_hard_links() {
    let source = create_source();
    let dest = TempDir::new().unwrap();
    let config = quiet_config();

    let summary = Syncer::new(source.path(), dest.path(), &config).run().unwrap();

    assert_eq!(summary.files, 4);
    assert_eq!(summary.copied, 2);
    assert_eq!(summary.duplicates, 2);
    assert_eq!(summary.links.created, 2);
    assert_eq!(summary.exit_code(), ExitCode::Success);

    let a = inode(&dest.path().join("a.txt"));
    assert_eq!(inode(&dest.path().join("b.txt")), a);
    assert_eq!(inode(&dest.path().join("sub/c.txt")), a);
    assert_ne!(inode(&dest.path().join("plain.txt")), a);
    assert_eq!(
        fs::read_to_string(dest.path().join("sub/c.txt")).unwrap(),
        "shared content"
    );
}

#[test]
#[cfg(unix)]
fn test_second_sync_keeps_links_consistent() {
    let source = create_source();
    let dest = TempDir::new().unwrap();
    let config = quiet_config();

    Syncer::new(source.path(), dest.path(), &config).run().unwrap();
    let summary = Syncer::new(source.path(), dest.path(), &config).run().unwrap();

    // The representative is rewritten through a temp file, so its inode
    // changes and the duplicates are relinked once more.
    assert_eq!(summary.links.failed, 0);
    assert_eq!(summary.links.pairs(), 2);
    let a = inode(&dest.path().join("a.txt"));
    assert_eq!(inode(&dest.path().join("b.txt")), a);
}

#[test]
#[cfg(unix)]
fn test_dry_run_touches_nothing() {
    let source = create_source();
    let parent = TempDir::new().unwrap();
    let dest = parent.path().join("out");
    let config = Config {
        dry_run: true,
        ..quiet_config()
    };

    let summary = Syncer::new(source.path(), &dest, &config).run().unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.copied, 2);
    assert_eq!(summary.duplicates, 2);
    assert_eq!(summary.links.pairs(), 0);
    assert!(!dest.exists());
}

#[test]
#[cfg(unix)]
fn test_no_hard_links_copies_every_name() {
    let source = create_source();
    let dest = TempDir::new().unwrap();
    let config = Config {
        preserve_hard_links: false,
        ..quiet_config()
    };

    let summary = Syncer::new(source.path(), dest.path(), &config).run().unwrap();

    assert_eq!(summary.copied, 4);
    assert_eq!(summary.duplicates, 0);
    assert_ne!(
        inode(&dest.path().join("a.txt")),
        inode(&dest.path().join("b.txt"))
    );
}

#[test]
#[cfg(unix)]
fn test_stale_destination_file_is_replaced_by_link() {
    let source = create_source();
    let dest = TempDir::new().unwrap();
    fs::write(dest.path().join("b.txt"), "stale").unwrap();
    let config = quiet_config();

    let summary = Syncer::new(source.path(), dest.path(), &config).run().unwrap();

    assert_eq!(summary.links.created, 2);
    assert_eq!(
        fs::read_to_string(dest.path().join("b.txt")).unwrap(),
        "shared content"
    );
}

#[test]
fn test_sync_without_links_is_plain_copy() {
    let source = TempDir::new().unwrap();
    fs::write(source.path().join("one"), "1").unwrap();
    fs::write(source.path().join("two"), "22").unwrap();
    let dest = TempDir::new().unwrap();
    let config = quiet_config();

    let summary = Syncer::new(source.path(), dest.path(), &config).run().unwrap();

    assert_eq!(summary.copied, 2);
    assert_eq!(summary.bytes_copied, 3);
    assert_eq!(summary.links.pairs(), 0);
    assert_eq!(fs::read_to_string(dest.path().join("two")).unwrap(), "22");
}

#[test]
#[cfg(unix)]
fn test_link_into_directory_with_no_copied_files() {
    let source = TempDir::new().unwrap();
    fs::create_dir_all(source.path().join("x/y")).unwrap();
    fs::write(source.path().join("a.txt"), "deep").unwrap();
    fs::hard_link(source.path().join("a.txt"), source.path().join("x/y/c.txt")).unwrap();
    let dest = TempDir::new().unwrap();
    let config = quiet_config();

    let summary = Syncer::new(source.path(), dest.path(), &config).run().unwrap();

    assert_eq!(summary.copied, 1);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.links.created, 1);
    assert_eq!(summary.links.failed, 0);
    assert_eq!(summary.exit_code(), ExitCode::Success);
    assert_eq!(
        inode(&dest.path().join("x/y/c.txt")),
        inode(&dest.path().join("a.txt"))
    );
}

#[test]
fn test_source_file_named_like_temp_copy_survives() {
    let source = TempDir::new().unwrap();
    fs::write(source.path().join("foo"), "real").unwrap();
    fs::write(source.path().join(".foo.linksync-tmp"), "lookalike").unwrap();
    let dest = TempDir::new().unwrap();
    let config = quiet_config();

    let summary = Syncer::new(source.path(), dest.path(), &config).run().unwrap();

    assert_eq!(summary.copied, 2);
    assert_eq!(summary.copy_failures, 0);
    assert_eq!(fs::read_to_string(dest.path().join("foo")).unwrap(), "real");
    assert_eq!(
        fs::read_to_string(dest.path().join(".foo.linksync-tmp")).unwrap(),
        "lookalike"
    );
}
