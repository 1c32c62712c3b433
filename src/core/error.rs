//! Error handling for brunodo
//!
//! This module provides the typed error taxonomy of the provisioning and launch
//! subsystem together with user-friendly error reporting for the CLI. The error
//! system follows two principles:
//! 1. **Strongly-typed errors** so callers (and tests) can match on the exact failure
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`BrunodoError`] - Enumerated error types for every failure in the core
//! - [`ErrorContext`] - Wrapper that adds user-friendly details and suggestions
//!
//! # Error Categories
//!
//! - **Release selection**: [`BrunodoError::InvalidVersion`], [`BrunodoError::UnsupportedPlatform`]
//! - **Retrieval**: [`BrunodoError::NetworkError`], [`BrunodoError::DownloadFailed`],
//!   [`BrunodoError::TooManyRedirects`], [`BrunodoError::Cancelled`]
//! - **Integrity and unpacking**: [`BrunodoError::HashMismatch`], [`BrunodoError::EntryNotFound`],
//!   [`BrunodoError::UnpackFailed`]
//! - **File system**: [`BrunodoError::IoError`], [`BrunodoError::WriteFailed`]
//! - **Ledger and configuration**: [`BrunodoError::LedgerCorrupt`],
//!   [`BrunodoError::VersionNotInstalled`], [`BrunodoError::NoUsableDefault`],
//!   [`BrunodoError::ConfigError`]
//! - **Launch**: [`BrunodoError::SpawnFailed`]
//!
//! None of these errors is retried inside the core. Every failure aborts the
//! current `ensure`/`run` call and surfaces to the caller unchanged.
//!
//! # Examples
//!
//! ```rust,no_run
//! use brunodo_cli::core::{BrunodoError, user_friendly_error};
//!
//! fn provision() -> Result<(), BrunodoError> {
//!     Err(BrunodoError::Cancelled)
//! }
//!
//! if let Err(e) = provision() {
//!     let ctx = user_friendly_error(anyhow::Error::from(e));
//!     ctx.display(); // colored error with a suggestion
//! }
//! ```

use colored::Colorize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Result alias used throughout the provisioning core.
pub type Result<T, E = BrunodoError> = std::result::Result<T, E>;

/// The main error type for brunodo operations
///
/// Each variant represents one failure mode of the provisioning and launch
/// pipeline. Variants carry plain strings, which keeps the type `Clone` and
/// `PartialEq`.
///
/// # Examples
///
/// ```rust,no_run
/// use brunodo_cli::core::BrunodoError;
///
/// fn describe(error: &BrunodoError) -> &'static str {
///     match error {
///         BrunodoError::HashMismatch { .. } => "download corrupted",
///         BrunodoError::Cancelled => "interrupted",
///         _ => "other failure",
///     }
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrunodoError {
    /// Version string is not a valid semantic version
    ///
    /// Raised by the release locator before any network activity.
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion {
        /// The rejected version string
        version: String,
        /// Parser message
        reason: String,
    },

    /// The host `os-arch` pair has no published release artifact
    #[error("Platform {platform} is not supported (supported: {supported})")]
    UnsupportedPlatform {
        /// The `os-arch` key of the host
        platform: String,
        /// Comma separated list of supported keys
        supported: String,
    },

    /// Transport level failure (DNS, connection reset, TLS, timeout)
    #[error("Network error while requesting {url}: {cause}")]
    NetworkError {
        /// URL being requested when the failure occurred
        url: String,
        /// Underlying transport error message
        cause: String,
    },

    /// The server answered with a status that is neither success nor a usable redirect
    #[error("Error {status_code} when downloading {url}: {status_message}")]
    DownloadFailed {
        /// URL that produced the status
        url: String,
        /// HTTP status code
        status_code: u16,
        /// Canonical reason phrase for the status
        status_message: String,
    },

    /// Redirect chain exceeded the configured cap
    #[error("Too many redirects (limit {limit}) while requesting {url}")]
    TooManyRedirects {
        /// The original URL of the request
        url: String,
        /// Maximum number of redirects that were allowed
        limit: usize,
    },

    /// The shared cancellation signal was triggered
    #[error("Operation cancelled")]
    Cancelled,

    /// Downloaded archive does not match its published digest
    #[error("Hash mismatch for {file}: expected {expected}, got {actual}")]
    HashMismatch {
        /// File whose digest was computed
        file: String,
        /// Digest published alongside the archive
        expected: String,
        /// Digest computed locally
        actual: String,
    },

    /// The executable is not present inside the archive
    #[error("Entry '{entry}' not found in archive {archive}")]
    EntryNotFound {
        /// Archive that was scanned
        archive: String,
        /// Entry name that was looked up
        entry: String,
    },

    /// The archive could not be unpacked or the binary is missing afterwards
    #[error("Failed to unpack {archive}: {reason}")]
    UnpackFailed {
        /// Archive being unpacked
        archive: String,
        /// What went wrong
        reason: String,
    },

    /// Reading from the file system failed
    #[error("I/O error during {operation} on {path}: {cause}")]
    IoError {
        /// Operation being performed (e.g. "hash", "read archive")
        operation: String,
        /// Path involved
        path: String,
        /// Underlying error message
        cause: String,
    },

    /// Writing a file to its destination failed
    #[error("Failed to write {path}: {cause}")]
    WriteFailed {
        /// Destination path
        path: String,
        /// Underlying error message
        cause: String,
    },

    /// The persisted version ledger cannot be parsed
    #[error("Version ledger {path} is corrupt: {reason}")]
    LedgerCorrupt {
        /// Path to the ledger file
        path: String,
        /// Parser message
        reason: String,
    },

    /// Requested version is not recorded in the ledger
    #[error("Version {version} is not installed")]
    VersionNotInstalled {
        /// Requested version
        version: String,
    },

    /// The ledger has no default version that points at an installed entry
    #[error("No usable default version found in the version ledger")]
    NoUsableDefault,

    /// Global configuration is invalid
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// The child process could not be started
    #[error("Failed to launch {path}: {cause}")]
    SpawnFailed {
        /// Executable path
        path: String,
        /// Underlying error message
        cause: String,
    },
}

impl BrunodoError {
    /// Build an [`BrunodoError::IoError`] from a std I/O error.
    pub fn io(operation: impl Into<String>, path: &Path, err: &std::io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            path: path.display().to_string(),
            cause: err.to_string(),
        }
    }

    /// Build a [`BrunodoError::WriteFailed`] from a std I/O error.
    pub fn write_failed(path: &Path, err: &std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.display().to_string(),
            cause: err.to_string(),
        }
    }
}

/// Error wrapper with user-facing details and suggestions
///
/// `ErrorContext` is what the binary prints right before exiting with a
/// non-zero status.
///
/// # Examples
///
/// ```rust,no_run
/// use brunodo_cli::core::{BrunodoError, ErrorContext};
///
/// let ctx = ErrorContext::new(BrunodoError::NoUsableDefault)
///     .with_suggestion("Run 'brunodo install <VERSION>' first");
/// ctx.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: BrunodoError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new context with no suggestion or details.
    #[must_use]
    pub const fn new(error: BrunodoError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach additional details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`]
///
/// Typed [`BrunodoError`]s anywhere in the `anyhow` chain get a tailored
/// suggestion. Anything else is reported as a configuration error carrying
/// the full context chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(typed) = error.chain().find_map(|e| e.downcast_ref::<BrunodoError>()) {
        let ctx = create_error_context(typed.clone());
        let outer = error.to_string();
        // Keep the outermost context message when it adds information
        if outer != typed.to_string() && ctx.details.is_none() {
            return ctx.with_details(outer);
        }
        return ctx;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(BrunodoError::IoError {
            operation: "file access".to_string(),
            path: "unknown".to_string(),
            cause: io_error.to_string(),
        })
        .with_suggestion("Check ownership of the brunodo config and data directories");
    }

    ErrorContext::new(BrunodoError::ConfigError {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: BrunodoError) -> ErrorContext {
    match &error {
        BrunodoError::InvalidVersion { .. } => ErrorContext::new(error)
            .with_suggestion("Use a semantic version such as 2.1.1 or 2.1.1-beta (without a leading 'v')"),

        BrunodoError::UnsupportedPlatform { .. } => ErrorContext::new(error)
            .with_details("nonodo publishes binaries for darwin, linux (amd64/arm64) and windows (amd64) only"),

        BrunodoError::NetworkError { .. } => ErrorContext::new(error)
            .with_suggestion("Check your internet connection and proxy settings, then try again"),

        BrunodoError::DownloadFailed { status_code: 404, .. } => ErrorContext::new(error)
            .with_suggestion("Check that the version exists with 'brunodo list --remote'"),

        BrunodoError::DownloadFailed { .. } | BrunodoError::TooManyRedirects { .. } => {
            ErrorContext::new(error)
                .with_suggestion("Check the 'base_url' setting in the brunodo config.toml")
        }

        BrunodoError::HashMismatch { .. } => ErrorContext::new(error)
            .with_suggestion("Try the installation again; if the problem persists the release may have been tampered with")
            .with_details("The downloaded archive was removed and nothing was installed"),

        BrunodoError::EntryNotFound { .. } | BrunodoError::UnpackFailed { .. } => {
            ErrorContext::new(error)
                .with_suggestion("The release archive has an unexpected layout; report it to the nonodo maintainers")
        }

        BrunodoError::WriteFailed { .. } | BrunodoError::IoError { .. } => ErrorContext::new(error)
            .with_suggestion("Check free disk space and permissions of the brunodo data directory"),

        BrunodoError::LedgerCorrupt { .. } => ErrorContext::new(error)
            .with_suggestion("Delete the ledger file and reinstall the versions you need"),

        BrunodoError::VersionNotInstalled { version } => {
            let hint = format!("Run 'brunodo install {version}' first");
            ErrorContext::new(error).with_suggestion(hint)
        }

        BrunodoError::NoUsableDefault => ErrorContext::new(error)
            .with_suggestion("Run 'brunodo install <VERSION>' or pass '--version' to 'brunodo run'"),

        BrunodoError::SpawnFailed { .. } => ErrorContext::new(error)
            .with_suggestion("Remove the binary from the brunodo data directory and run again to re-download it"),

        BrunodoError::Cancelled | BrunodoError::ConfigError { .. } => ErrorContext::new(error),
    }
}
