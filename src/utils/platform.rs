//! Platform-specific directory resolution.
//!
//! brunodo keeps two directories:
//!
//! - **Config directory**: the version ledger and `config.toml`
//!   - `$BRUNODO_CONFIG_DIR` when set
//!   - otherwise `dirs::config_dir()/brunodo`
//! - **Data directory**: downloaded archives, digests and extracted executables
//!   - `$BRUNODO_DATA_DIR` when set
//!   - otherwise the legacy `$PACKAGE_NONODO_DIR`
//!   - otherwise `dirs::data_dir()/brunodo`

use crate::core::{BrunodoError, Result};
use std::path::PathBuf;

/// Overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "BRUNODO_CONFIG_DIR";

/// Overrides the data (install) directory.
pub const DATA_DIR_ENV: &str = "BRUNODO_DATA_DIR";

/// Legacy override for the data directory, honoured after [`DATA_DIR_ENV`].
pub const LEGACY_DATA_DIR_ENV: &str = "PACKAGE_NONODO_DIR";

/// Returns `true` when compiled for Windows.
pub const fn is_windows() -> bool {
    cfg!(windows)
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Resolves the config directory.
///
/// # Errors
///
/// [`BrunodoError::ConfigError`] when no override is set and the platform
/// has no notion of a config directory.
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(dir) = env_path(CONFIG_DIR_ENV) {
        return Ok(dir);
    }
    dirs::config_dir().map(|p| p.join("brunodo")).ok_or_else(|| BrunodoError::ConfigError {
        message: format!(
            "Could not determine config directory; set {CONFIG_DIR_ENV}. {}",
            platform_help()
        ),
    })
}

/// Resolves the data (install) directory.
///
/// # Errors
///
/// [`BrunodoError::ConfigError`] when no override is set and the platform
/// has no notion of a data directory.
pub fn get_data_dir() -> Result<PathBuf> {
    if let Some(dir) = env_path(DATA_DIR_ENV).or_else(|| env_path(LEGACY_DATA_DIR_ENV)) {
        return Ok(dir);
    }
    dirs::data_dir().map(|p| p.join("brunodo")).ok_or_else(|| BrunodoError::ConfigError {
        message: format!(
            "Could not determine data directory; set {DATA_DIR_ENV}. {}",
            platform_help()
        ),
    })
}

fn platform_help() -> &'static str {
    if is_windows() {
        "On Windows: Check that the APPDATA environment variable is set"
    } else if cfg!(target_os = "macos") {
        "On macOS: Check that the HOME environment variable is set"
    } else {
        "On Linux: Check that the XDG_DATA_HOME or HOME environment variable is set"
    }
}
