//! Blob storage collaborator for certificate files
//!
//! Files are content-addressed: the reference is `sha256:<hex digest>` and the
//! bytes live under `<root>/<first two hex chars>/<digest>`.
//!
//! Blob writes are not part of the database transaction. The ledger writes a
//! file only after its rows are in place; if the transaction still rolls back
//! afterwards, the file stays on disk unreferenced and is reused by the next
//! upload of identical content.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

const REF_PREFIX: &str = "sha256:";

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Empty file cannot be stored")]
    Empty,

    #[error("Malformed blob reference: {0}")]
    BadReference(String),

    #[error("Blob not found: {0}")]
    Missing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores and retrieves opaque file content
pub trait BlobStore {
    /// Reference `store` would return for `content`, without writing anything
    fn reference_for(&self, content: &[u8]) -> Result<String, BlobError>;

    /// Store bytes, returning a stable reference
    fn store(&self, content: &[u8]) -> Result<String, BlobError>;

    /// Open a stored blob for reading
    fn retrieve(&self, reference: &str) -> Result<Box<dyn Read>, BlobError>;
}

/// Filesystem-backed blob store
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn digest(content: &[u8]) -> Result<String, BlobError> {
        if content.is_empty() {
            return Err(BlobError::Empty);
        }
        Ok(format!("{:x}", Sha256::digest(content)))
    }

    fn path_for(&self, digest: &str) -> PathBuf {
        self.root.join(&digest[..2]).join(digest)
    }

    fn digest_of(reference: &str) -> Result<&str, BlobError> {
        let digest = reference
            .strip_prefix(REF_PREFIX)
            .ok_or_else(|| BlobError::BadReference(reference.to_string()))?;
        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BlobError::BadReference(reference.to_string()));
        }
        Ok(digest)
    }
}

impl BlobStore for FsBlobStore {
    fn reference_for(&self, content: &[u8]) -> Result<String, BlobError> {
        Ok(format!("{}{}", REF_PREFIX, Self::digest(content)?))
    }

    fn store(&self, content: &[u8]) -> Result<String, BlobError> {
        let digest = Self::digest(content)?;
        let path = self.path_for(&digest);

        // Identical content is stored once
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let tmp = path.with_extension("tmp");
            fs::write(&tmp, content)?;
            fs::rename(&tmp, &path)?;
        }

        Ok(format!("{}{}", REF_PREFIX, digest))
    }

    fn retrieve(&self, reference: &str) -> Result<Box<dyn Read>, BlobError> {
        let digest = Self::digest_of(reference)?;
        let path = self.path_for(digest);
        match fs::File::open(&path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::Missing(reference.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_store_and_retrieve() {
        let tmp = tempdir().unwrap();
        let store = FsBlobStore::new(tmp.path());

        let reference = store.store(b"calibration data").unwrap();
        assert!(reference.starts_with("sha256:"));

        let mut content = String::new();
        store
            .retrieve(&reference)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "calibration data");
    }

    #[test]
    fn test_identical_content_shares_reference() {
        let tmp = tempdir().unwrap();
        let store = FsBlobStore::new(tmp.path());
        assert_eq!(store.store(b"same").unwrap(), store.store(b"same").unwrap());
    }

    #[test]
    fn test_reference_for_writes_nothing() {
        let tmp = tempdir().unwrap();
        let store = FsBlobStore::new(tmp.path());

        let reference = store.reference_for(b"pending").unwrap();
        assert!(matches!(store.retrieve(&reference), Err(BlobError::Missing(_))));
        assert_eq!(store.store(b"pending").unwrap(), reference);
        assert!(store.retrieve(&reference).is_ok());
    }

    #[test]
    fn test_empty_and_bad_references_rejected() {
        let tmp = tempdir().unwrap();
        let store = FsBlobStore::new(tmp.path());

        assert!(matches!(store.store(b""), Err(BlobError::Empty)));
        assert!(matches!(
            store.retrieve("md5:abc"),
            Err(BlobError::BadReference(_))
        ));
        let missing = format!("sha256:{}", "0".repeat(64));
        assert!(matches!(store.retrieve(&missing), Err(BlobError::Missing(_))));
    }
}
