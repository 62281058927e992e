//! Orphan pruner
//!
//! After a merge, deletes every live file whose relative path is absent
//! from the just-applied manifest (the reserved sync log excepted), then
//! removes directories left empty, bottom-up. The live root itself is
//! never removed.
//!
//! Runs strictly after the merge: a file present in both old and new
//! content is therefore never transiently deleted. Individual deletion
//! failures (vanished file, permission denied) are logged and skipped.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

use kiosksync_core::domain::{Manifest, RelativePath};

use crate::walker::FileWalk;
use crate::SyncError;

/// Delete live files not referenced by the manifest.
pub fn prune_orphans(live: &Path, manifest: &Manifest) -> Result<(), SyncError> {
    let referenced = manifest.paths();

    for path in FileWalk::new(live) {
        let path = path?;

        let relative = match path
            .strip_prefix(live)
            .ok()
            .and_then(|rel| RelativePath::from_path(rel).ok())
        {
            Some(relative) => relative,
            None => {
                warn!(file = %path.display(), "skipping unrepresentable path");
                continue;
            }
        };

        if referenced.contains(&relative) {
            continue;
        }

        debug!(file = %path.display(), "removing orphaned file");
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(file = %path.display(), "orphan vanished before deletion");
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "could not delete orphan");
            }
        }
    }

    Ok(())
}

/// Remove directories left empty by the prune, never the live root.
pub fn prune_empty_dirs(live: &Path) -> Result<(), SyncError> {
    for entry in fs::read_dir(live)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            prune_subdir(&entry.path());
        }
    }

    Ok(())
}

/// Depth-first removal of empty directory trees. Failures (e.g. a file
/// appearing concurrently) just leave the directory in place.
fn prune_subdir(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            prune_subdir(&entry.path());
        }
    }

    if fs::remove_dir(dir).is_ok() {
        debug!(dir = %dir.display(), "removed empty directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use kiosksync_core::domain::{ContentHash, Manifest};
    use kiosksync_core::SYNC_LOG_NAME;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn manifest_of(paths: &[&str]) -> Manifest {
        let mut manifest = Manifest::new();
        for path in paths {
            let segments = path.split('/').map(str::to_string).collect();
            manifest.push(
                RelativePath::new(segments).unwrap(),
                ContentHash::from_digest(&[0; 32]),
            );
        }
        manifest
    }

    #[test]
    fn test_prune_removes_unreferenced_files() {
        let live = tempfile::tempdir().unwrap();
        write(live.path(), "keep.txt", "a");
        write(live.path(), "drop.txt", "b");

        prune_orphans(live.path(), &manifest_of(&["keep.txt"])).unwrap();

        assert!(live.path().join("keep.txt").exists());
        assert!(!live.path().join("drop.txt").exists());
    }

    #[test]
    fn test_prune_spares_sync_log() {
        let live = tempfile::tempdir().unwrap();
        write(live.path(), SYNC_LOG_NAME, "2024-01-01T00:00:00Z");

        prune_orphans(live.path(), &manifest_of(&[])).unwrap();

        assert!(live.path().join(SYNC_LOG_NAME).exists());
    }

    #[test]
    fn test_prune_removes_emptied_directories() {
        let live = tempfile::tempdir().unwrap();
        write(live.path(), "sub/deep/only.txt", "x");
        write(live.path(), "kept/file.txt", "y");

        prune_orphans(live.path(), &manifest_of(&["kept/file.txt"])).unwrap();
        prune_empty_dirs(live.path()).unwrap();

        assert!(!live.path().join("sub").exists());
        assert!(live.path().join("kept/file.txt").exists());
        // The root itself survives even when everything under it is gone.
        assert!(live.path().is_dir());
    }

    #[test]
    fn test_prune_never_removes_empty_root() {
        let live = tempfile::tempdir().unwrap();

        prune_orphans(live.path(), &manifest_of(&[])).unwrap();
        prune_empty_dirs(live.path()).unwrap();

        assert!(live.path().is_dir());
    }

    #[test]
    fn test_prune_keeps_nested_empty_parents_with_content() {
        let live = tempfile::tempdir().unwrap();
        write(live.path(), "a/b/keep.txt", "x");
        write(live.path(), "a/c/drop.txt", "y");

        prune_orphans(live.path(), &manifest_of(&["a/b/keep.txt"])).unwrap();
        prune_empty_dirs(live.path()).unwrap();

        assert!(live.path().join("a/b/keep.txt").exists());
        assert!(!live.path().join("a/c").exists());
    }
}
