//! Content hashing for duplicate-upload detection.
//!
//! Google Play reports a SHA-1 digest for every binary it holds; comparing it
//! against the digest of a local file tells us whether an upload would be
//! rejected as a duplicate.

use std::io;
use std::path::Path;

use sha1::{Digest as _, Sha1};

/// Computes the SHA-1 digest of a file as a lower-case hex string.
///
/// The file is read in a streaming fashion on a blocking task, so arbitrarily
/// large APKs do not need to fit in memory.
pub async fn sha1_hex(path: &Path) -> io::Result<String> {
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let mut file = std::fs::File::open(&path)?;
        let mut hasher = Sha1::new();
        io::copy(&mut file, &mut hasher)?;
        Ok(hex::encode(hasher.finalize()))
    })
    .await
    .map_err(|e| io::Error::other(format!("hashing task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[tokio::test]
    async fn test_sha1_hex_known_digest() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(b"hello world").expect("Failed to write");

        let digest = sha1_hex(file.path()).await.expect("Failed to hash");
        assert_eq!(digest, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");
    }

    #[tokio::test]
    async fn test_sha1_hex_is_lower_case() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(&[0xffu8; 64]).expect("Failed to write");

        let digest = sha1_hex(file.path()).await.expect("Failed to hash");
        assert_eq!(digest, digest.to_lowercase());
        assert_eq!(digest.len(), 40);
    }

    #[tokio::test]
    async fn test_sha1_hex_missing_file() {
        let result = sha1_hex(Path::new("/does/not/exist.apk")).await;
        assert!(result.is_err());
    }
}
