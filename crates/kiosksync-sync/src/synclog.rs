//! Sync log
//!
//! The reserved file inside the live directory recording the timestamp
//! of the last successful synchronization. Written only under the
//! single-flight lock as a whole-file rewrite; the agent itself never
//! reads it back (the status path serves an in-memory timestamp), the
//! file exists for technicians inspecting a terminal.
//!
//! The file is absent until the first successful sync. It is excluded
//! from hashing, merging and pruning everywhere (see [`crate::walker`],
//! [`crate::merge`] and [`crate::prune`]).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use kiosksync_core::SYNC_LOG_NAME;

/// Path of the sync log inside the live directory.
#[must_use]
pub fn log_path(live: &Path) -> PathBuf {
    live.join(SYNC_LOG_NAME)
}

/// Record a successful synchronization at the given instant.
pub fn record_sync(live: &Path, timestamp: DateTime<Utc>) -> io::Result<()> {
    let path = log_path(live);
    debug!(path = %path.display(), %timestamp, "recording sync");

    let mut text = timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);
    text.push('\n');
    fs::write(path, text)
}
