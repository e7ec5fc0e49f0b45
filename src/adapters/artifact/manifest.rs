//! Integrity manifest for model artifacts.
//!
//! `manifest.json` lives next to the artifacts and binds each file name to
//! the SHA-256 digest of its contents. When present, the store refuses to
//! load an artifact the manifest does not list or whose digest differs.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// File name of the manifest inside the model directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Current manifest version.
pub const MANIFEST_VERSION: u32 = 1;

/// Errors raised while reading, writing or checking a manifest.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to access manifest: {0}")]
    Io(String),

    #[error("Invalid manifest format: {0}")]
    Format(String),

    #[error("{0} is not listed in manifest.json")]
    NotListed(String),

    #[error("SHA-256 mismatch for {file}: manifest has {expected}, file has {actual}")]
    HashMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    /// Unix timestamp (seconds) when the manifest was written.
    #[serde(default)]
    pub created_at: Option<i64>,
    /// File name → lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

impl ModelManifest {
    /// Read `manifest.json` from `dir`, if present.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn read(dir: &Path) -> Result<Option<Self>, ManifestError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read(&path).map_err(|e| ManifestError::Io(e.to_string()))?;
        let manifest: Self =
            serde_json::from_slice(&content).map_err(|e| ManifestError::Format(e.to_string()))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ManifestError::Format(format!(
                "unsupported manifest version {}",
                manifest.version
            )));
        }
        Ok(Some(manifest))
    }

    /// Hash the given files inside `dir` into a new manifest.
    ///
    /// # Errors
    /// Returns error if any file cannot be read.
    pub fn build<S: AsRef<str>>(dir: &Path, file_names: &[S]) -> Result<Self, ManifestError> {
        let mut files = BTreeMap::new();
        for name in file_names {
            let name = name.as_ref();
            let bytes = std::fs::read(dir.join(name))
                .map_err(|e| ManifestError::Io(format!("{name}: {e}")))?;
            files.insert(name.to_string(), sha256_hex(&bytes));
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            created_at: Some(chrono::Utc::now().timestamp()),
            files,
        })
    }

    /// Write this manifest to `dir/manifest.json`.
    ///
    /// # Errors
    /// Returns error if serialization or the write fails.
    pub fn write(&self, dir: &Path) -> Result<(), ManifestError> {
        let bytes =
            serde_json::to_vec_pretty(self).map_err(|e| ManifestError::Format(e.to_string()))?;
        std::fs::write(dir.join(MANIFEST_FILE), bytes).map_err(|e| ManifestError::Io(e.to_string()))
    }

    /// Check `bytes` against the digest recorded for `file_name`.
    ///
    /// # Errors
    /// Returns `NotListed` or `HashMismatch`.
    pub fn verify(&self, file_name: &str, bytes: &[u8]) -> Result<(), ManifestError> {
        let expected = self
            .files
            .get(file_name)
            .ok_or_else(|| ManifestError::NotListed(file_name.to_string()))?;
        let actual = sha256_hex(bytes);
        if !constant_time_eq_str(&expected.to_ascii_lowercase(), &actual) {
            return Err(ManifestError::HashMismatch {
                file: file_name.to_string(),
                expected: expected.clone(),
                actual,
            });
        }
        Ok(())
    }
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_build_write_read_verify() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.json"), b"{}").expect("write");

        let manifest = ModelManifest::build(dir.path(), &["a.json"]).expect("build");
        manifest.write(dir.path()).expect("write manifest");

        let read = ModelManifest::read(dir.path())
            .expect("read")
            .expect("manifest present");
        assert_eq!(read, manifest);
        read.verify("a.json", b"{}").expect("digest matches");

        let err = read.verify("a.json", b"{ }").unwrap_err();
        assert!(matches!(err, ManifestError::HashMismatch { .. }));
        assert_eq!(
            read.verify("b.json", b"{}").unwrap_err(),
            ManifestError::NotListed("b.json".into())
        );
    }

    #[test]
    fn test_missing_manifest_is_none() {
        let dir = tempdir().expect("tempdir");
        assert_eq!(ModelManifest::read(dir.path()).expect("read"), None);
    }

    #[test]
    fn test_malformed_manifest_is_error() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join(MANIFEST_FILE), b"not json").expect("write");
        assert!(matches!(
            ModelManifest::read(dir.path()),
            Err(ManifestError::Format(_))
        ));
    }

    #[test]
    fn test_build_fails_on_missing_file() {
        let dir = tempdir().expect("tempdir");
        assert!(matches!(
            ModelManifest::build(dir.path(), &["absent.bin"]),
            Err(ManifestError::Io(_))
        ));
    }
}
