//! Kiosksync Sync - Content synchronization engine
//!
//! Keeps the live content directory of a terminal in step with the
//! archive bundles distributed by the central server.
//!
//! ## Modules
//!
//! - [`walker`] - recursive checksum walk producing a [`Manifest`]
//! - [`stage`] - extraction of a tar.xz bundle into a staging directory
//! - [`merge`] - copying staged content over the live tree
//! - [`prune`] - removal of orphaned files and empty directories
//! - [`lock`] - the single-flight gate serializing all tree access
//! - [`synclog`] - the reserved last-sync timestamp file
//! - [`engine`] - the stage → merge → prune pipeline
//!
//! ## Safety order
//!
//! An update is fully staged and validated in a temporary directory
//! before the live tree is touched, then merged, then pruned. A file
//! present in both old and new content is therefore never transiently
//! deleted, and a corrupt bundle never modifies the live tree at all.
//!
//! All code here is synchronous; the server crate drives it through
//! `tokio::task::spawn_blocking`.

pub mod engine;
pub mod lock;
pub mod merge;
pub mod prune;
pub mod stage;
pub mod synclog;
pub mod walker;

#[cfg(test)]
pub(crate) mod testutil;

use std::path::PathBuf;

use thiserror::Error;

pub use engine::apply_update;
pub use lock::{FlightGuard, SingleFlight};

/// Errors that can occur during synchronization operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error occurred during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive stream could not be extracted (truncated or corrupt)
    #[error("Archive extraction failed: {0}")]
    Extract(std::io::Error),

    /// The staged archive contains no manifest file
    #[error("Manifest not found in archive")]
    ManifestMissing,

    /// The staged manifest file is not the expected structure
    #[error("Manifest unreadable: {0}")]
    ManifestUnreadable(String),

    /// One or more files could not be merged into the live tree
    #[error("{failed} of {total} files failed to merge")]
    PartialMerge {
        /// Number of files that could not be copied
        failed: usize,
        /// Total number of staged files
        total: usize,
    },

    /// A path in the live tree could not be expressed relative to the root
    #[error("Path escapes tree root: {0}")]
    PathEscapesRoot(PathBuf),

    /// A file name cannot be represented as a manifest path
    #[error("Unrepresentable path: {0}")]
    UnrepresentablePath(#[from] kiosksync_core::domain::DomainError),
}
