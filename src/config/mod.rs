//! Configuration: directories and user settings.
//!
//! - [`Directories`] - where the ledger/config and the installed releases live
//! - [`GlobalConfig`] - optional `config.toml` with network and verification settings

mod global;

pub use global::GlobalConfig;

use crate::core::Result;
use crate::utils::fs::ensure_dir;
use crate::utils::platform::{get_config_dir, get_data_dir};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The two directories brunodo works in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directories {
    /// Holds `.nonodorc.json` and `config.toml`.
    pub config_dir: PathBuf,
    /// Holds archives, digests and extracted executables.
    pub data_dir: PathBuf,
}

impl Directories {
    /// Resolves both directories from the environment and platform defaults.
    pub fn resolve() -> Result<Self> {
        Ok(Self {
            config_dir: get_config_dir()?,
            data_dir: get_data_dir()?,
        })
    }

    /// Uses explicit directories.
    pub fn new(config_dir: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Creates both directories if missing.
    pub fn ensure(&self) -> Result<()> {
        for (label, dir) in [("config", &self.config_dir), ("data", &self.data_dir)] {
            report(label, dir, ensure_dir(dir)?);
        }
        Ok(())
    }
}

fn report(label: &str, dir: &Path, created: bool) {
    if created {
        debug!("Created {} directory {}", label, dir.display());
    } else {
        debug!("Using existing {} directory {}", label, dir.display());
    }
}
