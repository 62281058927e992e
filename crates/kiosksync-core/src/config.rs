//! Agent configuration
//!
//! Typed configuration assembled by the daemon from command-line flags
//! and passed explicitly into the server (no global mutable state).

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default chunk size for file operations: four mebibytes.
///
/// Hashing, archive extraction and copies all proceed in chunks of this
/// size so memory use stays bounded regardless of content bundle size.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP listener binds to.
    pub address: IpAddr,
    /// Port the HTTP listener binds to.
    pub port: u16,
    /// The live directory holding the synchronized content.
    pub directory: PathBuf,
    /// Chunk size in bytes for hashing, extraction and copies.
    pub chunk_size: usize,
}

impl Config {
    /// Validate the configuration.
    ///
    /// The target directory must exist; a zero chunk size would make the
    /// chunked copy loops spin forever.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk size must be non-zero".to_string());
        }

        if !self.directory.is_dir() {
            return Err(format!(
                "target directory \"{}\" does not exist",
                self.directory.display()
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            directory: PathBuf::from("."),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.chunk_size, 4 * 1024 * 1024);
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let config = Config {
            chunk_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_directory() {
        let config = Config {
            directory: PathBuf::from("/nonexistent/kiosksync"),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            directory: dir.path().to_path_buf(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }
}
