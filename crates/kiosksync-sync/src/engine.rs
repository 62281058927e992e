//! Update pipeline
//!
//! Wires the stager, merger and pruner into the one operation the server
//! exposes: apply a tar.xz content bundle to the live directory.
//!
//! The pipeline is fail-fast and idempotent-to-retry: any error leaves
//! either an untouched live tree (staging/validation failures) or a tree
//! the caller may safely re-POST the same bundle at (merge failures).

use std::io::Read;
use std::path::Path;

use tracing::{error, info};

use crate::merge::merge_tree;
use crate::prune::{prune_empty_dirs, prune_orphans};
use crate::stage::stage_archive;
use crate::SyncError;

/// Apply a tar.xz content bundle to the live directory.
///
/// Stages and validates the whole bundle first, then merges staged files
/// over the live tree, then prunes orphans and emptied directories. The
/// staging directory is destroyed on every path out of this function.
pub fn apply_update<R: Read>(
    reader: R,
    live: &Path,
    chunk_size: usize,
) -> Result<(), SyncError> {
    let (staging, manifest) = stage_archive(reader, chunk_size)?;
    info!(
        files = manifest.len(),
        staging = %staging.path().display(),
        "bundle staged"
    );

    merge_tree(staging.path(), live, chunk_size).map_err(|err| {
        error!(error = %err, "merge failed");
        err
    })?;

    prune_orphans(live, &manifest)?;
    prune_empty_dirs(live)?;

    info!(files = manifest.len(), "live tree synchronized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::io::Cursor;

    use kiosksync_core::MANIFEST_NAME;

    use crate::testutil::{build_bundle, manifest_json, HELLO_SHA256};
    use crate::walker::gen_manifest;

    fn hello_bundle() -> Vec<u8> {
        let manifest = manifest_json(&[(&["sub", "file.txt"], HELLO_SHA256)]);
        build_bundle(&[
            (MANIFEST_NAME, manifest.as_slice()),
            ("sub/file.txt", b"hello"),
        ])
    }

    #[test]
    fn test_apply_update_to_empty_tree() {
        let live = tempfile::tempdir().unwrap();

        apply_update(Cursor::new(hello_bundle()), live.path(), 4096).unwrap();

        assert_eq!(
            fs::read_to_string(live.path().join("sub/file.txt")).unwrap(),
            "hello"
        );
        // The staged manifest must never surface in the live tree.
        assert!(!live.path().join(MANIFEST_NAME).exists());
    }

    #[test]
    fn test_apply_update_removes_orphans() {
        let live = tempfile::tempdir().unwrap();
        fs::write(live.path().join("old.txt"), "stale").unwrap();

        apply_update(Cursor::new(hello_bundle()), live.path(), 4096).unwrap();

        assert!(!live.path().join("old.txt").exists());
        assert!(live.path().join("sub/file.txt").exists());
    }

    #[test]
    fn test_apply_update_is_idempotent() {
        let live = tempfile::tempdir().unwrap();

        apply_update(Cursor::new(hello_bundle()), live.path(), 4096).unwrap();
        let first = gen_manifest(live.path(), 4096).unwrap();

        apply_update(Cursor::new(hello_bundle()), live.path(), 4096).unwrap();
        let second = gen_manifest(live.path(), 4096).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            fs::read_to_string(live.path().join("sub/file.txt")).unwrap(),
            "hello"
        );
    }

    #[test]
    fn test_corrupt_bundle_leaves_tree_untouched() {
        let live = tempfile::tempdir().unwrap();
        fs::write(live.path().join("precious.txt"), "keep me").unwrap();

        let mut bundle = hello_bundle();
        bundle.truncate(bundle.len() / 2);

        assert!(apply_update(Cursor::new(bundle), live.path(), 4096).is_err());

        assert_eq!(
            fs::read_to_string(live.path().join("precious.txt")).unwrap(),
            "keep me"
        );
        assert!(!live.path().join("sub").exists());
    }

    #[test]
    fn test_bundle_without_manifest_leaves_tree_untouched() {
        let live = tempfile::tempdir().unwrap();
        fs::write(live.path().join("precious.txt"), "keep me").unwrap();

        let bundle = build_bundle(&[("sub/file.txt", b"hello".as_slice())]);

        assert!(matches!(
            apply_update(Cursor::new(bundle), live.path(), 4096),
            Err(SyncError::ManifestMissing)
        ));
        assert!(live.path().join("precious.txt").exists());
        assert!(!live.path().join("sub").exists());
    }

    #[test]
    fn test_round_trip_matches_staged_manifest() {
        let live = tempfile::tempdir().unwrap();

        apply_update(Cursor::new(hello_bundle()), live.path(), 4096).unwrap();
        let walked = gen_manifest(live.path(), 4096).unwrap();

        assert_eq!(walked.len(), 1);
        let entry = walked.iter().next().unwrap();
        assert_eq!(entry.path().to_string(), "sub/file.txt");
        assert_eq!(entry.hash().as_str(), HELLO_SHA256);
    }
}
