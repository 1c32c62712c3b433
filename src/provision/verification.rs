//! Integrity verification of downloaded archives.
//!
//! Releases publish a digest sidecar next to every archive. The default
//! algorithm is MD5 because that is what the release pipeline publishes; MD5
//! detects corruption but is not collision resistant. SHA-256 can be selected
//! in the global config for origins that publish `.sha256` sidecars.

use crate::constants::HASH_BUFFER_SIZE;
use crate::core::{BrunodoError, Result};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Digest algorithm used to verify archives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5, matching the published `.md5` sidecars
    #[default]
    Md5,
    /// SHA-256, requires `.sha256` sidecars on the origin
    Sha256,
}

impl HashAlgorithm {
    /// Extension of the sidecar file, without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Hashes and compares files.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Streams `path` through `algorithm` and returns the lowercase hex digest.
    ///
    /// The file is read in fixed-size chunks, so archives of any size hash in
    /// constant memory.
    ///
    /// # Errors
    ///
    /// [`BrunodoError::IoError`] if the file cannot be opened or read.
    pub async fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
        debug!("Computing {} digest for: {}", algorithm, path.display());

        match algorithm {
            HashAlgorithm::Md5 => Self::digest_file::<Md5>(path).await,
            HashAlgorithm::Sha256 => Self::digest_file::<Sha256>(path).await,
        }
    }

    async fn digest_file<D: Digest>(path: &Path) -> Result<String> {
        let mut file =
            tokio::fs::File::open(path).await.map_err(|e| BrunodoError::io("hash", path, &e))?;

        let mut hasher = D::new();
        let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
        loop {
            let read =
                file.read(&mut buffer).await.map_err(|e| BrunodoError::io("hash", path, &e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Compares a published digest with a computed one.
    ///
    /// Surrounding whitespace (the trailing newline of a sidecar file) is
    /// trimmed from `expected`. The comparison itself is case-sensitive.
    pub fn verify(expected: &str, actual: &str) -> bool {
        expected.trim() == actual
    }

    /// Hashes `path` and fails with [`BrunodoError::HashMismatch`] unless it
    /// matches `expected`. Returns the computed digest on success.
    pub async fn verify_file(path: &Path, expected: &str, algorithm: HashAlgorithm) -> Result<String> {
        let actual = Self::hash_file(path, algorithm).await?;
        if !Self::verify(expected, &actual) {
            return Err(BrunodoError::HashMismatch {
                file: path.display().to_string(),
                expected: expected.trim().to_string(),
                actual,
            });
        }
        info!("Checksum verification successful for {}", path.display());
        Ok(actual)
    }
}
