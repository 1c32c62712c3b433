//! Shared setup for CLI commands.

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::config::{Directories, GlobalConfig};
use crate::ledger::FileLedgerStore;
use crate::provision::{CancelSignal, Downloader, Provisioner};
use crate::utils::progress::ProgressReporter;

use super::CliConfig;

/// Everything a command needs: directories, settings and progress output.
#[derive(Clone)]
pub struct CommandContext {
    /// Config and data directories (both exist once the context is built).
    pub dirs: Directories,
    /// Loaded `config.toml`.
    pub config: GlobalConfig,
    /// Progress output shared by downloads.
    pub progress: ProgressReporter,
}

impl CommandContext {
    /// Resolves directories, creates them and loads the global config.
    pub async fn load(cli: &CliConfig) -> Result<Self> {
        let dirs = match (&cli.config_dir, &cli.data_dir) {
            (Some(config_dir), Some(data_dir)) => Directories::new(config_dir, data_dir),
            (config_dir, data_dir) => {
                let resolved = Directories::resolve().context("Failed to resolve brunodo directories")?;
                Directories::new(
                    config_dir.clone().unwrap_or(resolved.config_dir),
                    data_dir.clone().unwrap_or(resolved.data_dir),
                )
            }
        };
        dirs.ensure().context("Failed to create brunodo directories")?;

        let config = GlobalConfig::load(&dirs.config_dir)
            .await
            .with_context(|| format!("Failed to load configuration from {}", dirs.config_dir.display()))?;

        Ok(Self {
            dirs,
            config,
            progress: ProgressReporter::new(!cli.no_progress),
        })
    }

    /// Store for the version ledger in the config directory.
    pub fn ledger_store(&self) -> FileLedgerStore {
        FileLedgerStore::new(&self.dirs.config_dir)
    }

    /// HTTP client configured from the global config.
    pub fn downloader(&self) -> Result<Downloader> {
        Ok(Downloader::with_config(self.config.downloader_config(), self.progress.clone())?)
    }

    /// Provisioner installing into the data directory.
    pub fn provisioner(&self) -> Result<Provisioner> {
        Ok(Provisioner::new(
            self.downloader()?,
            self.config.provisioner_config(&self.dirs.data_dir),
        ))
    }
}

/// Cancels a [`CancelSignal`] on Ctrl-C until dropped.
///
/// Used while downloading; it must be dropped before a child process is
/// launched so that the launcher's own signal forwarding takes over.
pub struct InterruptWatcher {
    handle: JoinHandle<()>,
}

impl InterruptWatcher {
    /// Starts watching for Ctrl-C.
    pub fn spawn(cancel: CancelSignal) -> Self {
        let handle = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling download");
                cancel.cancel();
            }
        });
        Self { handle }
    }
}

impl Drop for InterruptWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
