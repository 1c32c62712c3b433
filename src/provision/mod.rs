//! Artifact provisioning for the nonodo executable.
//!
//! Components, leaf first:
//!
//! - [`platform`] - host OS/CPU to release naming
//! - [`verification`] - streamed digests and comparison
//! - [`archive`] - tar scan and zip lookup of the executable
//! - [`download`] - HTTP retrieval with bounded redirects
//! - [`cancel`] - cancellation shared by concurrent downloads
//! - [`release`] - release file names and URLs
//! - [`provisioner`] - orchestration of the above
//!
//! ```rust,no_run
//! use brunodo_cli::provision::{CancelSignal, Downloader, DownloaderConfig, HashAlgorithm, Provisioner, ProvisionerConfig};
//! use brunodo_cli::utils::ProgressReporter;
//!
//! # async fn example() -> brunodo_cli::core::Result<()> {
//! let downloader = Downloader::with_config(DownloaderConfig::default(), ProgressReporter::new(true))?;
//! let provisioner = Provisioner::new(downloader, ProvisionerConfig {
//!     base_url: brunodo_cli::constants::DEFAULT_BASE_URL.to_string(),
//!     install_dir: "/tmp/brunodo".into(),
//!     hash_algorithm: HashAlgorithm::Md5,
//!     verify_installed: false,
//! });
//! let outcome = provisioner.ensure(&CancelSignal::new(), "2.1.1-beta").await?;
//! println!("{}", outcome.path.display());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod cancel;
pub mod download;
pub mod platform;
pub mod provisioner;
pub mod release;
pub mod verification;

pub use cancel::CancelSignal;
pub use download::{DownloadTransfer, Downloader, DownloaderConfig};
pub use platform::{Arch, Os, PlatformTriple};
pub use provisioner::{ProvisionOutcome, Provisioner, ProvisionerConfig};
pub use release::{ArchiveKind, ReleaseDescriptor, describe, parse_archive_name};
pub use verification::{ChecksumVerifier, HashAlgorithm};
