//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`fs`] - Atomic writes, directory creation and executable permissions
//! - [`platform`] - Config and data directory resolution
//! - [`progress`] - Byte progress bars and spinners for downloads
//!
//! # Example
//!
//! ```rust,no_run
//! use brunodo_cli::utils::{atomic_write, ensure_dir};
//! use std::path::Path;
//!
//! # fn example() -> brunodo_cli::core::Result<()> {
//! ensure_dir(Path::new("/tmp/brunodo"))?;
//! atomic_write(Path::new("/tmp/brunodo/.nonodorc.json"), b"{}")?;
//! # Ok(())
//! # }
//! ```

pub mod fs;
pub mod platform;
pub mod progress;

pub use fs::{atomic_write, ensure_dir, remove_if_exists, write_executable};
pub use platform::{get_config_dir, get_data_dir, is_windows};
pub use progress::{ProgressBar, ProgressReporter};
