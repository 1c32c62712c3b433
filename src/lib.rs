//! brunodo - version manager and launcher for nonodo
//!
//! brunodo provisions the `nonodo` development node for the running platform:
//! it locates the release archive for a version, downloads it together with
//! its published digest, verifies the digest, extracts the executable, records
//! the installed version in a local ledger and finally runs it in the
//! foreground, relaying interrupts to it.
//!
//! # Architecture Overview
//!
//! ```text
//! cli ──> Provisioner::ensure(version)
//!           ├─ PlatformTriple::resolve
//!           ├─ release::describe
//!           ├─ Downloader::fetch       (digest + archive, concurrently)
//!           ├─ ChecksumVerifier::verify_file
//!           └─ archive::install_binary
//!     ──> VersionLedger::add_version + LedgerStore::save
//!     ──> ProcessLauncher::run ──> exit_like(outcome)
//! ```
//!
//! # Modules
//!
//! - [`cli`] - command-line front end (`install`, `run`, `use`, `list`)
//! - [`config`] - config/data directories and `config.toml`
//! - [`core`] - error types and user-facing error reporting
//! - [`launcher`] - child process supervision and signal relay
//! - [`ledger`] - persisted record of installed versions
//! - [`provision`] - platform, release naming, download, verification, extraction
//! - [`utils`] - atomic writes, directory helpers, progress bars
//!
//! # Files
//!
//! - `<config dir>/.nonodorc.json` - the version ledger
//! - `<config dir>/config.toml` - optional settings
//! - `<data dir>/nonodo-v<version>-<os>-<arch>[.tar.gz|.zip|.md5|.exe]` - releases

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod launcher;
pub mod ledger;
pub mod provision;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
