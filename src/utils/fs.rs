//! File system helpers with atomic writes and permission handling.
//!
//! Writes that must never be observed half-finished (the version ledger, the
//! global config, extracted executables) go through [`atomic_write`], which
//! writes a sibling temp file, syncs it and renames it over the target.

use crate::core::{BrunodoError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Ensures a directory exists, creating it and all parents if needed.
///
/// Returns `true` when the directory was created by this call and `false`
/// when it was already present.
///
/// # Errors
///
/// - [`BrunodoError::WriteFailed`] if the directory cannot be created
/// - [`BrunodoError::IoError`] if the path exists but is not a directory
///
/// # Examples
///
/// ```rust,no_run
/// use brunodo_cli::utils::ensure_dir;
/// use std::path::Path;
///
/// # fn example() -> brunodo_cli::core::Result<()> {
/// let created = ensure_dir(Path::new("/tmp/brunodo/data"))?;
/// println!("created: {created}");
/// # Ok(())
/// # }
/// ```
pub fn ensure_dir(path: &Path) -> Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    if path.exists() {
        return Err(BrunodoError::IoError {
            operation: "create directory".to_string(),
            path: path.display().to_string(),
            cause: "path exists but is not a directory".to_string(),
        });
    }
    fs::create_dir_all(path).map_err(|e| BrunodoError::write_failed(path, &e))?;
    Ok(true)
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// 1. Content goes to `<file name>.tmp` next to the target
/// 2. The temp file is synced to disk
/// 3. The temp file is renamed over the target
///
/// Readers therefore see either the old content or the new content, never a
/// partial write. Parent directories are created when missing.
///
/// # Errors
///
/// Returns [`BrunodoError::WriteFailed`] naming the target path if any step fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }

    let temp_path = temp_sibling(path);
    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(BrunodoError::write_failed(path, &e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        BrunodoError::write_failed(path, &e)
    })
}

/// Writes an executable file atomically and marks it `0o755` on Unix.
///
/// On other platforms the permission step is a no-op; executability there is
/// determined by the `.exe` extension.
pub fn write_executable(path: &Path, content: &[u8]) -> Result<()> {
    atomic_write(path, content)?;
    set_executable_permissions(path)
}

#[cfg(unix)]
fn set_executable_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| BrunodoError::write_failed(path, &e))
}

#[cfg(not(unix))]
fn set_executable_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Removes a file, treating "not found" as success.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BrunodoError::io("remove file", path, &e)),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
