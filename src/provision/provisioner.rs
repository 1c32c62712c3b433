//! Provisioner: makes sure a nonodo version is available locally.
//!
//! The install directory is flat. For each version it holds the archive,
//! the digest sidecar and the extracted executable:
//!
//! ```text
//! <install dir>/
//! ├── nonodo-v2.1.1-beta-linux-amd64.tar.gz
//! ├── nonodo-v2.1.1-beta-linux-amd64.tar.gz.md5
//! └── nonodo-v2.1.1-beta-linux-amd64
//! ```
//!
//! An executable that is already present is trusted as-is unless
//! `verify_installed` is enabled. There is no cross-process locking, so two
//! concurrent installs into the same directory are unsupported.

use crate::core::{BrunodoError, Result};
use crate::provision::archive::install_binary;
use crate::provision::cancel::CancelSignal;
use crate::provision::download::Downloader;
use crate::provision::platform::PlatformTriple;
use crate::provision::release::{ReleaseDescriptor, describe};
use crate::provision::verification::{ChecksumVerifier, HashAlgorithm};
use crate::utils::fs::{ensure_dir, remove_if_exists};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Settings that shape where and how releases are provisioned.
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    /// Release origin.
    pub base_url: String,
    /// Flat directory holding archives, digests and executables.
    pub install_dir: PathBuf,
    /// Digest algorithm (and sidecar extension).
    pub hash_algorithm: HashAlgorithm,
    /// Re-verify the cached archive of an already present executable.
    pub verify_installed: bool,
}

/// Result of a successful [`Provisioner::ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    /// Path of the executable.
    pub path: PathBuf,
    /// Verified digest of the archive; `None` when an existing executable
    /// was reused without verification.
    pub hash: Option<String>,
    /// Whether this call downloaded and extracted the release.
    pub downloaded: bool,
}

/// Orchestrates release lookup, download, verification and extraction.
pub struct Provisioner {
    downloader: Downloader,
    platform: PlatformTriple,
    config: ProvisionerConfig,
}

impl Provisioner {
    /// Creates a provisioner for the host platform.
    pub fn new(downloader: Downloader, config: ProvisionerConfig) -> Self {
        Self {
            downloader,
            platform: PlatformTriple::resolve(),
            config,
        }
    }

    /// Overrides the platform (used by tests and cross-provisioning).
    #[must_use]
    pub fn with_platform(mut self, platform: PlatformTriple) -> Self {
        self.platform = platform;
        self
    }

    /// The platform releases are selected for.
    pub fn platform(&self) -> &PlatformTriple {
        &self.platform
    }

    /// Describes the release of `version` for this provisioner's platform.
    pub fn describe(&self, version: &str) -> Result<ReleaseDescriptor> {
        describe(version, &self.platform, &self.config.base_url)
    }

    /// Ensures the executable for `version` exists locally and returns its path.
    ///
    /// 1. The platform must be supported, otherwise
    ///    [`BrunodoError::UnsupportedPlatform`] with no network activity
    /// 2. An existing executable is returned without a hash, or re-verified
    ///    when `verify_installed` is on
    /// 3. Digest and archive are fetched concurrently
    /// 4. The archive hash must match the digest, otherwise the download is
    ///    removed and [`BrunodoError::HashMismatch`] is returned
    /// 5. The executable is extracted next to the archive
    pub async fn ensure(&self, cancel: &CancelSignal, version: &str) -> Result<ProvisionOutcome> {
        self.platform.ensure_supported()?;
        let release = self.describe(version)?;
        debug!("Platform {} -> {}", self.platform, release.archive_name);

        let binary_path = self.config.install_dir.join(&release.binary_name);
        if binary_path.exists() {
            if !self.config.verify_installed {
                debug!("Using existing executable {}", binary_path.display());
                return Ok(ProvisionOutcome {
                    path: binary_path,
                    hash: None,
                    downloaded: false,
                });
            }

            match self.verify_cached(&release).await? {
                Some(hash) => {
                    debug!("Existing executable {} verified", binary_path.display());
                    return Ok(ProvisionOutcome {
                        path: binary_path,
                        hash: Some(hash),
                        downloaded: false,
                    });
                }
                None => warn!(
                    "Cached archive for {} is missing or does not match its digest, downloading again",
                    release.version
                ),
            }
        }

        ensure_dir(&self.config.install_dir)?;
        let hash = self.download_and_verify(&release, cancel).await?;

        let archive_path = self.archive_path(&release);
        install_binary(
            &archive_path,
            release.archive_kind,
            release.archive_kind.inner_name(),
            &binary_path,
        )
        .await?;

        if !binary_path.exists() {
            return Err(BrunodoError::UnpackFailed {
                archive: archive_path.display().to_string(),
                reason: format!("{} was not created", binary_path.display()),
            });
        }

        info!("nonodo {} installed at {}", release.version, binary_path.display());
        Ok(ProvisionOutcome {
            path: binary_path,
            hash: Some(hash),
            downloaded: true,
        })
    }

    async fn download_and_verify(&self, release: &ReleaseDescriptor, cancel: &CancelSignal) -> Result<String> {
        let algorithm = self.config.hash_algorithm;
        let archive_path = self.archive_path(release);
        let digest_path = self.digest_path(release);
        let archive_url = release.archive_url();
        let digest_url = release.digest_url(algorithm);

        info!("Downloading nonodo {} from {}", release.version, archive_url);
        futures::future::try_join(
            self.downloader.fetch_to_file(&digest_url, &digest_path, cancel),
            self.downloader.fetch_to_file(&archive_url, &archive_path, cancel),
        )
        .await?;

        let expected = tokio::fs::read_to_string(&digest_path)
            .await
            .map_err(|e| BrunodoError::io("read digest", &digest_path, &e))?;

        match ChecksumVerifier::verify_file(&archive_path, &expected, algorithm).await {
            Ok(actual) => Ok(actual),
            Err(err @ BrunodoError::HashMismatch { .. }) => {
                warn!("Removing {} after failed verification", archive_path.display());
                remove_if_exists(&archive_path)?;
                remove_if_exists(&digest_path)?;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Re-hashes the cached archive against its cached digest.
    ///
    /// Returns `None` when either file is missing or they disagree.
    async fn verify_cached(&self, release: &ReleaseDescriptor) -> Result<Option<String>> {
        let archive_path = self.archive_path(release);
        let digest_path = self.digest_path(release);
        if !archive_path.exists() || !digest_path.exists() {
            return Ok(None);
        }

        let expected = tokio::fs::read_to_string(&digest_path)
            .await
            .map_err(|e| BrunodoError::io("read digest", &digest_path, &e))?;
        let actual = ChecksumVerifier::hash_file(&archive_path, self.config.hash_algorithm).await?;

        Ok(ChecksumVerifier::verify(&expected, &actual).then_some(actual))
    }

    fn archive_path(&self, release: &ReleaseDescriptor) -> PathBuf {
        self.config.install_dir.join(&release.archive_name)
    }

    fn digest_path(&self, release: &ReleaseDescriptor) -> PathBuf {
        self.config.install_dir.join(release.digest_file_name(self.config.hash_algorithm))
    }
}
