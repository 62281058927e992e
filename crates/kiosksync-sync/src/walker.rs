//! Checksum walker
//!
//! Recursively lists regular files under the live directory and computes
//! a SHA-256 digest per file, in fixed-size chunks so memory use stays
//! bounded for arbitrarily large content bundles.
//!
//! Exclusion rules (applied consistently here and in the pruner):
//! - the reserved sync log file is excluded at every depth
//! - dot-prefixed entries are excluded at the top level only; nested
//!   dotfiles are ordinary content
//!
//! The walk is read-only and best-effort: a file that vanishes between
//! listing and hashing (a race with external mutation) is skipped with a
//! warning instead of failing the whole manifest.

use std::fs::{self, File};
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use kiosksync_core::domain::{ContentHash, Manifest, RelativePath};
use kiosksync_core::SYNC_LOG_NAME;

use crate::SyncError;

/// Iterator over the regular files of a tree, in directory-traversal
/// order. Yields absolute paths.
pub struct FileWalk {
    /// Directories still to be read, depth-first. The flag marks the
    /// tree root, where the dotfile exclusion applies.
    pending: Vec<(PathBuf, bool)>,
    /// Entries of the directory currently being drained.
    current: Vec<fs::DirEntry>,
}

impl FileWalk {
    /// Start a walk at the given root.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            pending: vec![(root.to_path_buf(), true)],
            current: Vec::new(),
        }
    }

    /// Read the next pending directory into `current`.
    ///
    /// Returns `false` when no directories remain.
    fn refill(&mut self) -> io::Result<bool> {
        let Some((dir, is_root)) = self.pending.pop() else {
            return Ok(false);
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(dir = %dir.display(), "directory vanished during walk");
                return Ok(true);
            }
            Err(err) => return Err(err),
        };

        for entry in entries {
            let entry = entry?;

            if is_root && entry.file_name().to_string_lossy().starts_with('.') {
                debug!(entry = %entry.path().display(), "skipping top-level dot entry");
                continue;
            }

            self.current.push(entry);
        }

        Ok(true)
    }
}

impl Iterator for FileWalk {
    type Item = io::Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(entry) = self.current.pop() else {
                match self.refill() {
                    Ok(true) => continue,
                    Ok(false) => return None,
                    Err(err) => return Some(Err(err)),
                }
            };

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    warn!(entry = %entry.path().display(), "entry vanished during walk");
                    continue;
                }
                Err(err) => return Some(Err(err)),
            };

            if file_type.is_dir() {
                self.pending.push((entry.path(), false));
            } else if file_type.is_file() {
                if entry.file_name().to_string_lossy() == SYNC_LOG_NAME {
                    continue;
                }
                return Some(Ok(entry.path()));
            } else {
                warn!(entry = %entry.path().display(), "skipping non-regular file");
            }
        }
    }
}

/// Compute the SHA-256 digest of a file, reading in `chunk_size` chunks.
pub fn sha256_file(path: &Path, chunk_size: usize) -> io::Result<ContentHash> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; chunk_size];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(ContentHash::from_digest(&hasher.finalize().into()))
}

/// Generate the manifest of relative file paths and their SHA-256
/// checksums for the tree rooted at `root`.
pub fn gen_manifest(root: &Path, chunk_size: usize) -> Result<Manifest, SyncError> {
    let mut manifest = Manifest::new();

    for path in FileWalk::new(root) {
        let path = path?;

        let relative = path
            .strip_prefix(root)
            .map_err(|_| SyncError::PathEscapesRoot(path.clone()))?;
        let relative = RelativePath::from_path(relative)?;

        let hash = match sha256_file(&path, chunk_size) {
            Ok(hash) => hash,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(file = %path.display(), "file vanished during walk");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        debug!(file = %relative, hash = %hash, "hashed file");
        manifest.push(relative, hash);
    }

    Ok(manifest)
}
