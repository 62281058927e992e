//! Shared server state
//!
//! One instance per server, shared across connection tasks via `Arc`.
//! Per-server configuration is injected here explicitly (constructor
//! injection, no globals), and the only mutable pieces are the
//! single-flight lock and the last-sync timestamp.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use kiosksync_core::config::Config;
use kiosksync_sync::SingleFlight;

/// State shared by all request handlers of one server.
#[derive(Debug)]
pub struct ServerState {
    /// The live content directory.
    pub directory: PathBuf,
    /// Chunk size for hashing, extraction and copies.
    pub chunk_size: usize,
    /// The single-flight gate serializing updates and manifest walks.
    pub lock: Arc<SingleFlight>,
    /// Timestamp of the last successful sync of this process.
    ///
    /// Process-wide and reset on restart; the on-disk sync log is
    /// write-only from the agent's perspective.
    last_sync: RwLock<Option<DateTime<Utc>>>,
}

impl ServerState {
    /// Create server state from the agent configuration.
    #[must_use]
    pub fn new(config: &Config) -> Arc<Self> {
        Arc::new(Self {
            directory: config.directory.clone(),
            chunk_size: config.chunk_size,
            lock: SingleFlight::new(),
            last_sync: RwLock::new(None),
        })
    }

    /// The last successful sync, if any happened in this process.
    #[must_use]
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        // A poisoned lock only means a writer panicked mid-store of a
        // Copy value; the value itself is still usable.
        *self.last_sync.read().unwrap_or_else(|err| err.into_inner())
    }

    /// Record a successful sync.
    pub fn set_last_sync(&self, timestamp: DateTime<Utc>) {
        *self
            .last_sync
            .write()
            .unwrap_or_else(|err| err.into_inner()) = Some(timestamp);
    }
}
