//! Domain error types
//!
//! Validation failures for paths, hashes and manifests. These errors are
//! free of HTTP knowledge; the server crate translates them to status
//! codes at the protocol boundary.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid relative path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid content hash format (expected 64 lowercase hex characters)
    #[error("Invalid hash format: {0}")]
    InvalidHash(String),

    /// The manifest is structurally invalid
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),
}
