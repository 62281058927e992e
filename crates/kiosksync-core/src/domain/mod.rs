//! Domain types for content synchronization
//!
//! - [`manifest`] - content-addressed manifest of a directory tree
//! - [`errors`] - domain-level error types

pub mod errors;
pub mod manifest;

pub use errors::DomainError;
pub use manifest::{ContentHash, Manifest, ManifestEntry, RelativePath};
