//! Content digests.
//!
//! Two widths are used: the change index stores a 128-bit xxHash3 value per
//! entry, while the router keeps a sha-256 hex string per seen file. They are
//! never compared against each other.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_128;

/// Fixed-width fingerprint of a file's contents, as stored in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 16]);

impl ContentHash {
    /// Digest a byte slice with xxHash3-128.
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        Self(xxh3_128(data).to_be_bytes())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Stream a file through sha-256 and return the lowercase hex digest.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn file_digest_hex(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_content_hash() {
        let hash1 = ContentHash::of(b"Hello, World!");
        let hash2 = ContentHash::of(b"Hello, World!");
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.to_string().len(), 32);

        assert_ne!(hash1, ContentHash::of(b"Different data"));
    }

    #[test]
    fn test_file_digest_hex() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.txt");
        std::fs::write(&file_path, "abc")?;

        let digest = file_digest_hex(&file_path)?;
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        Ok(())
    }

    #[test]
    fn test_file_digest_missing_file() {
        let dir = tempdir().unwrap();
        assert!(file_digest_hex(&dir.path().join("nope")).is_err());
    }
}
