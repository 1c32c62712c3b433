//! Release locator: names and URLs of published nonodo artifacts.
//!
//! A release for version `V` on platform `os-arch` is published as
//!
//! ```text
//! <base>/vV/nonodo-vV-<os>-<arch>.tar.gz       (zip on windows)
//! <base>/vV/nonodo-vV-<os>-<arch>.tar.gz.md5   (digest sidecar)
//! ```
//!
//! and contains a single executable, `nonodo` (or `nonodo.exe` on windows).

use crate::constants::{PRODUCT_NAME, TAR_INNER_NAME, ZIP_INNER_NAME};
use crate::core::{BrunodoError, Result};
use crate::provision::platform::PlatformTriple;
use crate::provision::verification::HashAlgorithm;
use semver::Version;

/// Container format of a release archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// gzip-compressed tarball
    TarGz,
    /// zip archive (windows)
    Zip,
}

impl ArchiveKind {
    /// File extension including the leading dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::TarGz => ".tar.gz",
            Self::Zip => ".zip",
        }
    }

    /// Name of the executable entry stored inside archives of this kind.
    pub const fn inner_name(self) -> &'static str {
        match self {
            Self::TarGz => TAR_INNER_NAME,
            Self::Zip => ZIP_INNER_NAME,
        }
    }
}

/// Everything needed to fetch and unpack one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    /// Validated semantic version, without a leading `v`
    pub version: Version,
    /// Release origin, without trailing slash
    pub base_url: String,
    /// e.g. `nonodo-v2.1.1-beta-linux-amd64.tar.gz`
    pub archive_name: String,
    /// e.g. `nonodo-v2.1.1-beta-linux-amd64`
    pub binary_name: String,
    /// Container format
    pub archive_kind: ArchiveKind,
}

impl ReleaseDescriptor {
    /// URL of the archive.
    pub fn archive_url(&self) -> String {
        format!("{}/v{}/{}", self.base_url, self.version, self.archive_name)
    }

    /// URL of the digest sidecar for `algorithm`.
    pub fn digest_url(&self, algorithm: HashAlgorithm) -> String {
        format!("{}.{}", self.archive_url(), algorithm.extension())
    }

    /// Local file name of the digest sidecar for `algorithm`.
    pub fn digest_file_name(&self, algorithm: HashAlgorithm) -> String {
        format!("{}.{}", self.archive_name, algorithm.extension())
    }
}

/// Describes the release of `version` for `platform` under `base_url`.
///
/// # Errors
///
/// [`BrunodoError::InvalidVersion`] when `version` is not a semantic version.
/// This happens before anything touches the network.
pub fn describe(version: &str, platform: &PlatformTriple, base_url: &str) -> Result<ReleaseDescriptor> {
    let parsed = parse_version(version)?;

    let archive_kind = if platform.is_windows() {
        ArchiveKind::Zip
    } else {
        ArchiveKind::TarGz
    };
    let stem = format!("{PRODUCT_NAME}-v{parsed}-{}-{}", platform.os.as_str(), platform.arch.as_str());
    let binary_ext = if platform.is_windows() { ".exe" } else { "" };

    Ok(ReleaseDescriptor {
        version: parsed,
        base_url: base_url.trim_end_matches('/').to_string(),
        archive_name: format!("{stem}{}", archive_kind.extension()),
        binary_name: format!("{stem}{binary_ext}"),
        archive_kind,
    })
}

/// Validates a version string as semver.
pub fn parse_version(version: &str) -> Result<Version> {
    Version::parse(version).map_err(|e| BrunodoError::InvalidVersion {
        version: version.to_string(),
        reason: e.to_string(),
    })
}

/// Components recovered from an archive name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveNameParts {
    /// Version, without the leading `v`
    pub version: String,
    /// OS identifier
    pub os: String,
    /// Architecture identifier
    pub arch: String,
}

/// Recovers `(version, os, arch)` from a name produced by [`describe`].
///
/// The version may itself contain dashes (`2.1.1-beta`), so the name is
/// split from the right.
pub fn parse_archive_name(name: &str) -> Option<ArchiveNameParts> {
    let rest = name.strip_prefix(PRODUCT_NAME)?.strip_prefix("-v")?;
    let stem = [ArchiveKind::TarGz, ArchiveKind::Zip]
        .iter()
        .find_map(|kind| rest.strip_suffix(kind.extension()))?;

    let mut parts = stem.rsplitn(3, '-');
    let arch = parts.next()?;
    let os = parts.next()?;
    let version = parts.next()?;
    if version.is_empty() || os.is_empty() || arch.is_empty() {
        return None;
    }

    Some(ArchiveNameParts {
        version: version.to_string(),
        os: os.to_string(),
        arch: arch.to_string(),
    })
}
