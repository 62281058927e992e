//! Tree merger
//!
//! Copies every file from the staging directory into the live directory
//! at the same relative path, creating intermediate directories and
//! overwriting existing files via chunked copy.
//!
//! A single unwritable file must not block the rest of the update, so
//! per-file failures are logged and skipped; any such failure still makes
//! the merge as a whole report failure, so the caller never records a
//! successful sync for a tree that is only partially updated.
//!
//! A staged file named like the reserved sync log is ignored at every
//! depth: the log belongs to the agent, never to a content bundle.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use kiosksync_core::SYNC_LOG_NAME;

use crate::SyncError;

/// Copy a single file in `chunk_size` chunks, overwriting `dst`.
pub fn copy_file(src: &Path, dst: &Path, chunk_size: usize) -> std::io::Result<()> {
    let mut src_file = File::open(src)?;
    let mut dst_file = File::create(dst)?;
    let mut buffer = vec![0u8; chunk_size];

    loop {
        let read = src_file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        dst_file.write_all(&buffer[..read])?;
    }

    dst_file.flush()
}

/// Merge the staged tree into the live tree.
///
/// Returns an error if any file could not be copied; the remaining files
/// are still merged first.
pub fn merge_tree(staged: &Path, live: &Path, chunk_size: usize) -> Result<(), SyncError> {
    let mut total = 0;
    let mut failed = 0;

    merge_dir(staged, live, chunk_size, &mut total, &mut failed)?;

    if failed > 0 {
        warn!(failed, total, "merge completed with failures");
        return Err(SyncError::PartialMerge { failed, total });
    }

    debug!(total, "merge complete");
    Ok(())
}

/// Recursive worker for one directory level.
fn merge_dir(
    src: &Path,
    dst: &Path,
    chunk_size: usize,
    total: &mut usize,
    failed: &mut usize,
) -> Result<(), SyncError> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let source_path = entry.path();
        let dest_path = dst.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_file() {
            if entry.file_name().to_string_lossy() == SYNC_LOG_NAME {
                warn!(file = %source_path.display(), "ignoring reserved file in bundle");
                continue;
            }

            *total += 1;
            info!(file = %dest_path.display(), "updating file");

            if let Err(err) = copy_file(&source_path, &dest_path, chunk_size) {
                warn!(
                    file = %dest_path.display(),
                    error = %err,
                    "failed to update file"
                );
                *failed += 1;
            }
        } else if file_type.is_dir() {
            // A live file occupying the directory's path has to go first.
            if dest_path.is_file() {
                fs::remove_file(&dest_path)?;
            }

            if !dest_path.is_dir() {
                fs::create_dir_all(&dest_path)?;
            }

            merge_dir(&source_path, &dest_path, chunk_size, total, failed)?;
        } else {
            warn!(file = %source_path.display(), "skipping non-regular staged file");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_merge_copies_and_overwrites() {
        let staged = tempfile::tempdir().unwrap();
        let live = tempfile::tempdir().unwrap();

        write(staged.path(), "new.txt", "new");
        write(staged.path(), "sub/nested.txt", "nested");
        write(live.path(), "new.txt", "stale");

        merge_tree(staged.path(), live.path(), 1024).unwrap();

        assert_eq!(fs::read_to_string(live.path().join("new.txt")).unwrap(), "new");
        assert_eq!(
            fs::read_to_string(live.path().join("sub/nested.txt")).unwrap(),
            "nested"
        );
    }

    #[test]
    fn test_merge_replaces_file_with_directory() {
        let staged = tempfile::tempdir().unwrap();
        let live = tempfile::tempdir().unwrap();

        write(staged.path(), "sub/inner.txt", "content");
        // The live tree has a plain file where the update needs a directory.
        write(live.path(), "sub", "i am a file");

        merge_tree(staged.path(), live.path(), 1024).unwrap();

        assert!(live.path().join("sub").is_dir());
        assert_eq!(
            fs::read_to_string(live.path().join("sub/inner.txt")).unwrap(),
            "content"
        );
    }

    #[test]
    fn test_merge_copies_large_file_in_chunks() {
        let staged = tempfile::tempdir().unwrap();
        let live = tempfile::tempdir().unwrap();

        let content = "x".repeat(10_000);
        write(staged.path(), "big.bin", &content);

        // Chunk size far smaller than the file forces many iterations.
        merge_tree(staged.path(), live.path(), 16).unwrap();

        assert_eq!(
            fs::read_to_string(live.path().join("big.bin")).unwrap(),
            content
        );
    }

    #[test]
    fn test_merge_ignores_reserved_sync_log() {
        let staged = tempfile::tempdir().unwrap();
        let live = tempfile::tempdir().unwrap();

        write(staged.path(), SYNC_LOG_NAME, "bogus");
        write(staged.path(), &format!("sub/{SYNC_LOG_NAME}"), "also bogus");
        write(staged.path(), "content.txt", "real");
        write(live.path(), SYNC_LOG_NAME, "2024-01-01T00:00:00Z");

        merge_tree(staged.path(), live.path(), 1024).unwrap();

        // The live log keeps its value; the bundle copy never lands.
        assert_eq!(
            fs::read_to_string(live.path().join(SYNC_LOG_NAME)).unwrap(),
            "2024-01-01T00:00:00Z"
        );
        assert!(!live.path().join("sub").join(SYNC_LOG_NAME).exists());
        assert_eq!(
            fs::read_to_string(live.path().join("content.txt")).unwrap(),
            "real"
        );
    }

    #[test]
    fn test_merge_skips_unwritable_file_but_reports_failure() {
        let staged = tempfile::tempdir().unwrap();
        let live = tempfile::tempdir().unwrap();

        write(staged.path(), "clash.txt", "update");
        write(staged.path(), "ok.txt", "fine");
        // The live tree has a directory where the update has a plain
        // file, so this one copy cannot succeed.
        fs::create_dir(live.path().join("clash.txt")).unwrap();

        let result = merge_tree(staged.path(), live.path(), 1024);

        assert!(matches!(
            result,
            Err(SyncError::PartialMerge {
                failed: 1,
                total: 2
            })
        ));
        // The writable file was still merged.
        assert_eq!(fs::read_to_string(live.path().join("ok.txt")).unwrap(), "fine");
    }
}
