//! Shared helpers for unit tests.

use xz2::write::XzEncoder;

/// Build a tar.xz bundle in memory from (path, content) pairs.
pub(crate) fn build_bundle(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(XzEncoder::new(Vec::new(), 6));

    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, *content).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// Render a manifest JSON body from (segments, hash) pairs.
pub(crate) fn manifest_json(entries: &[(&[&str], &str)]) -> Vec<u8> {
    let entries: Vec<_> = entries
        .iter()
        .map(|(segments, hash)| serde_json::json!([segments, hash]))
        .collect();
    serde_json::to_vec(&entries).unwrap()
}

/// SHA-256 of the five bytes `hello`, lowercase hex.
pub(crate) const HELLO_SHA256: &str =
    "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
