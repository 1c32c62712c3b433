//! Platform resolution for release artifacts.
//!
//! Maps the host OS and CPU identifiers onto the naming convention used by
//! nonodo releases (`darwin`/`linux`/`windows`, `amd64`/`arm64`). Resolution
//! never fails: unknown identifiers pass through verbatim and support is
//! checked later by the provisioner against
//! [`SUPPORTED_PLATFORMS`](crate::constants::SUPPORTED_PLATFORMS).

use crate::constants::SUPPORTED_PLATFORMS;
use crate::core::{BrunodoError, Result};
use std::fmt;

/// Operating system component of a release name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Os {
    /// macOS
    Darwin,
    /// Linux
    Linux,
    /// Windows
    Windows,
    /// Any other host identifier, kept verbatim
    Other(String),
}

impl Os {
    /// Maps a host OS identifier onto the release naming.
    pub fn from_host_id(id: &str) -> Self {
        match id {
            "macos" | "darwin" => Self::Darwin,
            "linux" => Self::Linux,
            "windows" | "win32" => Self::Windows,
            other => Self::Other(other.to_string()),
        }
    }

    /// The identifier used in release file names.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Other(id) => id,
        }
    }
}

/// CPU architecture component of a release name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 64-bit x86
    Amd64,
    /// 64-bit ARM
    Arm64,
    /// Any other host identifier, kept verbatim
    Other(String),
}

impl Arch {
    /// Maps a host CPU identifier onto the release naming.
    pub fn from_host_id(id: &str) -> Self {
        match id {
            "x86_64" | "x64" | "amd64" => Self::Amd64,
            "aarch64" | "arm64" => Self::Arm64,
            other => Self::Other(other.to_string()),
        }
    }

    /// The identifier used in release file names.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::Other(id) => id,
        }
    }
}

/// The `{os, arch}` pair a release is built for.
///
/// Derived once per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformTriple {
    /// Operating system
    pub os: Os,
    /// CPU architecture
    pub arch: Arch,
}

impl PlatformTriple {
    /// Resolves the platform of the running host.
    pub fn resolve() -> Self {
        Self::from_host_ids(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Builds a triple from raw host identifiers.
    pub fn from_host_ids(os: &str, arch: &str) -> Self {
        Self {
            os: Os::from_host_id(os),
            arch: Arch::from_host_id(arch),
        }
    }

    /// The `os-arch` key, e.g. `linux-amd64`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.os.as_str(), self.arch.as_str())
    }

    /// Whether releases are published for this platform.
    pub fn is_supported(&self) -> bool {
        let key = self.key();
        SUPPORTED_PLATFORMS.iter().any(|supported| *supported == key)
    }

    /// Fails with [`BrunodoError::UnsupportedPlatform`] unless supported.
    pub fn ensure_supported(&self) -> Result<()> {
        if self.is_supported() {
            return Ok(());
        }
        Err(BrunodoError::UnsupportedPlatform {
            platform: self.key(),
            supported: SUPPORTED_PLATFORMS.join(", "),
        })
    }

    /// Whether this is a Windows platform.
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }
}

impl fmt::Display for PlatformTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
