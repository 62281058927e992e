//! Archive stager
//!
//! Extracts an incoming tar.xz content bundle into a freshly created,
//! exclusively-owned staging directory, then locates and parses the
//! manifest file the server embeds at the bundle root.
//!
//! The manifest file is deleted from the staged tree immediately after
//! being read so it can never be merged into the live directory as if it
//! were content.
//!
//! Nothing here touches the live tree: a truncated stream, a corrupt
//! filter or a missing/garbled manifest aborts the update before any
//! mutation, and the staging directory is destroyed on drop either way.

use std::fs;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use tar::Archive;
use tempfile::TempDir;
use tracing::{debug, error};
use xz2::read::XzDecoder;

use kiosksync_core::domain::Manifest;
use kiosksync_core::MANIFEST_NAME;

use crate::SyncError;

/// Extract a tar.xz stream into a new staging directory and parse the
/// embedded manifest.
///
/// On success the caller receives the staging directory handle (cleanup
/// on drop) and the parsed manifest, with the manifest file already
/// removed from the staged tree.
pub fn stage_archive<R: Read>(reader: R, chunk_size: usize) -> Result<(TempDir, Manifest), SyncError> {
    let staging = TempDir::with_prefix("kiosksync-staging-")?;
    debug!(staging = %staging.path().display(), "extracting archive");

    let decoder = XzDecoder::new(BufReader::with_capacity(chunk_size, reader));
    let mut archive = Archive::new(decoder);

    // `unpack` refuses entries that would escape the staging directory.
    if let Err(err) = archive.unpack(staging.path()) {
        error!(error = %err, "archive extraction failed");
        return Err(SyncError::Extract(err));
    }

    let manifest = load_manifest(staging.path())?;
    Ok((staging, manifest))
}

/// Read, parse and delete the manifest file at the staged tree root.
fn load_manifest(staged: &Path) -> Result<Manifest, SyncError> {
    let path = staged.join(MANIFEST_NAME);
    debug!(manifest = %path.display(), "reading staged manifest");

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            error!(manifest = %path.display(), "manifest not found in archive");
            return Err(SyncError::ManifestMissing);
        }
        Err(err) => return Err(err.into()),
    };

    let manifest: Manifest = serde_json::from_str(&text).map_err(|err| {
        error!(error = %err, "staged manifest is not valid");
        SyncError::ManifestUnreadable(err.to_string())
    })?;

    // Remove the file so it is never treated as live content.
    fs::remove_file(&path)?;

    Ok(manifest)
}
