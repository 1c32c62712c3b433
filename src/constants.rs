//! Global constants used throughout the brunodo codebase.
//!
//! Release naming, network limits and file names shared by the provisioning
//! core and the CLI live here so the values are discoverable in one place.

use std::time::Duration;

/// Name of the managed companion executable.
pub const PRODUCT_NAME: &str = "nonodo";

/// Default origin of published release artifacts.
pub const DEFAULT_BASE_URL: &str = "https://github.com/calindra/nonodo/releases/download";

/// Endpoint listing the tags of the nonodo repository.
pub const TAGS_URL: &str = "https://api.github.com/repos/calindra/nonodo/tags";

/// User-Agent sent with every outgoing request.
pub const USER_AGENT: &str = concat!("brunodo/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirect hops followed for one request.
pub const MAX_REDIRECTS: usize = 10;

/// Default overall timeout for a single request (5 minutes).
///
/// Release archives are tens of megabytes, so this is generous on purpose
/// for slow links. It bounds a hung connection, not a slow one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Connect timeout for outgoing requests.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// File name of the version ledger inside the config directory.
pub const LEDGER_FILE_NAME: &str = ".nonodorc.json";

/// File name of the global configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// `os-arch` keys for which releases are published.
pub const SUPPORTED_PLATFORMS: &[&str] =
    &["darwin-amd64", "darwin-arm64", "linux-amd64", "linux-arm64", "windows-amd64"];

/// Version launched by `run` when the ledger has no usable default.
pub const DEFAULT_PINNED_VERSION: &str = "2.1.1-beta";

/// Entry name of the executable inside `.tar.gz` releases.
pub const TAR_INNER_NAME: &str = "nonodo";

/// Entry name of the executable inside `.zip` releases.
pub const ZIP_INNER_NAME: &str = "nonodo.exe";

/// Buffer size used when streaming files through a digest.
pub const HASH_BUFFER_SIZE: usize = 8192;

/// Tar header and padding block size.
pub const TAR_BLOCK_SIZE: usize = 512;
