//! Kiosksync Core - Domain logic shared by all agent crates
//!
//! This crate contains the types exchanged between the sync engine, the
//! administrative RPC layer and the HTTP server:
//! - **Domain types** - `Manifest`, `RelativePath`, `ContentHash`
//! - **Response** - the uniform (payload, content-type, status) triple
//!   every request path produces
//! - **Config** - typed agent configuration with defaults
//!
//! The domain module is pure: it knows nothing about HTTP, the filesystem
//! layout or the platform commands. All of that lives in the adapter
//! crates (`kiosksync-sync`, `kiosksync-rpc`, `kiosksync-server`).

pub mod config;
pub mod domain;
pub mod response;

/// Name of the reserved synchronization log file inside the live
/// directory. It is never hashed, never merged over and never pruned.
pub const SYNC_LOG_NAME: &str = "synclog.txt";

/// Well-known name of the manifest file at the root of a content archive.
pub const MANIFEST_NAME: &str = "manifest.json";
