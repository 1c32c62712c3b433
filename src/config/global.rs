//! Global configuration (`config.toml` in the brunodo config directory).
//!
//! Every field is optional; a missing file or missing keys fall back to the
//! defaults below.
//!
//! ```toml
//! # Release origin; useful for mirrors
//! base_url = "https://github.com/calindra/nonodo/releases/download"
//!
//! # "md5" (published by upstream) or "sha256" (requires .sha256 sidecars)
//! hash_algorithm = "md5"
//!
//! max_redirects = 10
//! request_timeout_secs = 300
//!
//! # Re-hash the cached archive of an already installed version before running it
//! verify_installed = false
//! ```

use crate::constants::{CONFIG_FILE_NAME, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT, MAX_REDIRECTS};
use crate::core::{BrunodoError, Result};
use crate::provision::{DownloaderConfig, HashAlgorithm, ProvisionerConfig};
use crate::utils::fs::atomic_write;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_max_redirects() -> usize {
    MAX_REDIRECTS
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

/// User settings loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Release origin.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Digest algorithm used to verify archives.
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,

    /// Maximum redirect hops per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Idle timeout for network reads, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Re-verify cached archives of installed versions.
    #[serde(default)]
    pub verify_installed: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            hash_algorithm: HashAlgorithm::default(),
            max_redirects: default_max_redirects(),
            request_timeout_secs: default_request_timeout_secs(),
            verify_installed: false,
        }
    }
}

impl GlobalConfig {
    /// Path of `config.toml` inside `config_dir`.
    pub fn path_in(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads `config.toml` from `config_dir`, or defaults when it is absent.
    pub async fn load(config_dir: &Path) -> Result<Self> {
        let path = Self::path_in(config_dir);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// - [`BrunodoError::IoError`] if the file cannot be read
    /// - [`BrunodoError::ConfigError`] if it cannot be parsed or is invalid
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BrunodoError::io("read config", path, &e))?;
        let config: Self = toml::from_str(&content).map_err(|e| BrunodoError::ConfigError {
            message: format!("failed to parse {}: {e}", path.display()),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config to `path` atomically.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| BrunodoError::ConfigError {
            message: format!("failed to serialize config: {e}"),
        })?;
        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || atomic_write(&target, content.as_bytes()))
            .await
            .map_err(|e| BrunodoError::WriteFailed {
                path: path.display().to_string(),
                cause: e.to_string(),
            })?
    }

    /// Checks values that parse but cannot work.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| BrunodoError::ConfigError {
            message: format!("invalid base_url '{}': {e}", self.base_url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(BrunodoError::ConfigError {
                message: format!("base_url must use http or https, got '{}'", url.scheme()),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(BrunodoError::ConfigError {
                message: "request_timeout_secs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Downloader settings derived from this config.
    pub fn downloader_config(&self) -> DownloaderConfig {
        DownloaderConfig {
            read_timeout: Duration::from_secs(self.request_timeout_secs),
            max_redirects: self.max_redirects,
            ..DownloaderConfig::default()
        }
    }

    /// Provisioner settings derived from this config.
    pub fn provisioner_config(&self, install_dir: &Path) -> ProvisionerConfig {
        ProvisionerConfig {
            base_url: self.base_url.clone(),
            install_dir: install_dir.to_path_buf(),
            hash_algorithm: self.hash_algorithm,
            verify_installed: self.verify_installed,
        }
    }
}
