//! Content-addressed manifest of a directory tree
//!
//! A [`Manifest`] is an ordered collection of (relative path, content
//! hash) pairs, one per regular file in a tree. Paths are stored as
//! segment sequences rather than joined strings so the wire format is
//! unambiguous across platform path separators.
//!
//! Wire form (JSON): an array of `[["sub", "file.txt"], "<hex digest>"]`
//! pairs. This is the shape exchanged with the distribution server in
//! both directions.

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// RelativePath
// ============================================================================

/// A validated path relative to the live directory root.
///
/// Invariants enforced at construction:
/// - at least one segment
/// - no empty segments
/// - no `.` / `..` segments
/// - no path separators inside a segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct RelativePath(Vec<String>);

impl RelativePath {
    /// Create a relative path from its segments, validating each one.
    pub fn new(segments: Vec<String>) -> Result<Self, DomainError> {
        if segments.is_empty() {
            return Err(DomainError::InvalidPath("empty path".to_string()));
        }

        for segment in &segments {
            if segment.is_empty() {
                return Err(DomainError::InvalidPath("empty segment".to_string()));
            }
            if segment == "." || segment == ".." {
                return Err(DomainError::InvalidPath(format!(
                    "illegal segment: {segment}"
                )));
            }
            if segment.contains('/') || segment.contains('\\') {
                return Err(DomainError::InvalidPath(format!(
                    "separator inside segment: {segment}"
                )));
            }
        }

        Ok(Self(segments))
    }

    /// Create a relative path from an already-relative filesystem path.
    ///
    /// Fails if the path is absolute or contains non-normal components.
    pub fn from_path(path: &Path) -> Result<Self, DomainError> {
        let mut segments = Vec::new();

        for component in path.components() {
            match component {
                Component::Normal(os) => match os.to_str() {
                    Some(s) => segments.push(s.to_string()),
                    None => {
                        return Err(DomainError::InvalidPath(format!(
                            "non-UTF-8 path: {}",
                            path.display()
                        )))
                    }
                },
                _ => {
                    return Err(DomainError::InvalidPath(format!(
                        "non-relative path: {}",
                        path.display()
                    )))
                }
            }
        }

        Self::new(segments)
    }

    /// The path segments, in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The final segment (file name).
    #[must_use]
    pub fn file_name(&self) -> &str {
        // Invariant: at least one segment.
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// Render the path as a native `PathBuf` below the given root.
    #[must_use]
    pub fn to_path_under(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in &self.0 {
            path.push(segment);
        }
        path
    }
}

impl Display for RelativePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl TryFrom<Vec<String>> for RelativePath {
    type Error = DomainError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<RelativePath> for Vec<String> {
    fn from(path: RelativePath) -> Self {
        path.0
    }
}

// ============================================================================
// ContentHash
// ============================================================================

/// A SHA-256 content digest rendered as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Length of a SHA-256 digest in hex characters.
    const HEX_LEN: usize = 64;

    /// Create a content hash from its lowercase hex rendering.
    pub fn new(hex: String) -> Result<Self, DomainError> {
        if hex.len() != Self::HEX_LEN
            || !hex.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
        {
            return Err(DomainError::InvalidHash(hex));
        }

        Ok(Self(hex))
    }

    /// Create a content hash from a raw 32-byte digest.
    #[must_use]
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// The lowercase hex rendering.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = DomainError;

    fn try_from(hex: String) -> Result<Self, Self::Error> {
        Self::new(hex)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

// ============================================================================
// Manifest
// ============================================================================

/// One manifest entry: a relative path and the hash of its content.
///
/// Serializes as a two-element JSON array `[segments, hex]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry(pub RelativePath, pub ContentHash);

impl ManifestEntry {
    /// The entry's relative path.
    #[must_use]
    pub fn path(&self) -> &RelativePath {
        &self.0
    }

    /// The entry's content hash.
    #[must_use]
    pub fn hash(&self) -> &ContentHash {
        &self.1
    }
}

/// An ordered collection of (relative path, content hash) pairs.
///
/// Invariant: paths are unique. Order is directory-traversal order of the
/// producer; consumers must not rely on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ManifestEntry>", into = "Vec<ManifestEntry>")]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Create an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create a manifest from entries, rejecting duplicate paths.
    pub fn from_entries(entries: Vec<ManifestEntry>) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.path().clone()) {
                return Err(DomainError::InvalidManifest(format!(
                    "duplicate path: {}",
                    entry.path()
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Append an entry. The caller is responsible for path uniqueness;
    /// the walker guarantees it by construction.
    pub fn push(&mut self, path: RelativePath, hash: ContentHash) {
        self.entries.push(ManifestEntry(path, hash));
    }

    /// Whether the manifest references the given path.
    #[must_use]
    pub fn contains(&self, path: &RelativePath) -> bool {
        self.entries.iter().any(|entry| entry.path() == path)
    }

    /// Iterate over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }

    /// The set of referenced paths, for orphan detection.
    #[must_use]
    pub fn paths(&self) -> HashSet<&RelativePath> {
        self.entries.iter().map(ManifestEntry::path).collect()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<ManifestEntry>> for Manifest {
    type Error = DomainError;

    fn try_from(entries: Vec<ManifestEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl From<Manifest> for Vec<ManifestEntry> {
    fn from(manifest: Manifest) -> Self {
        manifest.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_of(byte: u8) -> ContentHash {
        ContentHash::from_digest(&[byte; 32])
    }

    #[test]
    fn test_relative_path_valid() {
        let path = RelativePath::new(vec!["sub".to_string(), "file.txt".to_string()]).unwrap();
        assert_eq!(path.segments(), ["sub", "file.txt"]);
        assert_eq!(path.file_name(), "file.txt");
        assert_eq!(path.to_string(), "sub/file.txt");
    }

    #[test]
    fn test_relative_path_rejects_traversal() {
        assert!(RelativePath::new(vec!["..".to_string()]).is_err());
        assert!(RelativePath::new(vec![".".to_string()]).is_err());
        assert!(RelativePath::new(vec![]).is_err());
        assert!(RelativePath::new(vec!["a/b".to_string()]).is_err());
        assert!(RelativePath::new(vec![String::new()]).is_err());
    }

    #[test]
    fn test_relative_path_from_path() {
        let path = RelativePath::from_path(Path::new("sub/file.txt")).unwrap();
        assert_eq!(path.segments(), ["sub", "file.txt"]);

        assert!(RelativePath::from_path(Path::new("/etc/passwd")).is_err());
        assert!(RelativePath::from_path(Path::new("../up")).is_err());
    }

    #[test]
    fn test_path_under_root() {
        let path = RelativePath::new(vec!["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(
            path.to_path_under(Path::new("/live")),
            PathBuf::from("/live/a/b")
        );
    }

    #[test]
    fn test_content_hash_validation() {
        let hex = "a".repeat(64);
        assert!(ContentHash::new(hex).is_ok());

        assert!(ContentHash::new("short".to_string()).is_err());
        assert!(ContentHash::new("A".repeat(64)).is_err());
        assert!(ContentHash::new("g".repeat(64)).is_err());
    }

    #[test]
    fn test_content_hash_from_digest() {
        let hash = ContentHash::from_digest(&[0xab; 32]);
        assert_eq!(hash.as_str(), "ab".repeat(32));
    }

    #[test]
    fn test_manifest_wire_format() {
        let path = RelativePath::new(vec!["sub".to_string(), "file.txt".to_string()]).unwrap();
        let manifest = Manifest::from_entries(vec![ManifestEntry(path, hash_of(1))]).unwrap();

        let json = serde_json::to_value(&manifest).unwrap();
        let expected = serde_json::json!([[["sub", "file.txt"], "01".repeat(32)]]);
        assert_eq!(json, expected);

        let parsed: Manifest = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn test_manifest_rejects_duplicates() {
        let path = RelativePath::new(vec!["file".to_string()]).unwrap();
        let entries = vec![
            ManifestEntry(path.clone(), hash_of(1)),
            ManifestEntry(path, hash_of(2)),
        ];
        assert!(Manifest::from_entries(entries).is_err());
    }

    #[test]
    fn test_manifest_rejects_malformed_json() {
        // Entry is not a [segments, hash] pair.
        let json = serde_json::json!([["sub/file.txt", "deadbeef"]]);
        assert!(serde_json::from_value::<Manifest>(json).is_err());

        // Hash is not valid hex.
        let json = serde_json::json!([[["file"], "not-a-hash"]]);
        assert!(serde_json::from_value::<Manifest>(json).is_err());

        // Top level is not an array.
        let json = serde_json::json!({"file": "hash"});
        assert!(serde_json::from_value::<Manifest>(json).is_err());
    }

    #[test]
    fn test_manifest_contains_and_paths() {
        let a = RelativePath::new(vec!["a".to_string()]).unwrap();
        let b = RelativePath::new(vec!["b".to_string()]).unwrap();
        let manifest =
            Manifest::from_entries(vec![ManifestEntry(a.clone(), hash_of(1))]).unwrap();

        assert!(manifest.contains(&a));
        assert!(!manifest.contains(&b));
        assert_eq!(manifest.paths().len(), 1);
    }
}
