//! Persistence backends for the version ledger.

use super::VersionLedger;
use crate::constants::LEDGER_FILE_NAME;
use crate::core::{BrunodoError, Result};
use crate::utils::fs::atomic_write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Where a [`VersionLedger`] is loaded from and saved to.
pub trait LedgerStore: Send + Sync {
    /// Whether a persisted ledger exists.
    fn exists(&self) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Loads the ledger. A missing ledger loads as empty with no default.
    ///
    /// # Errors
    ///
    /// [`BrunodoError::LedgerCorrupt`] when the persisted form cannot be parsed.
    fn load(&self) -> impl std::future::Future<Output = Result<VersionLedger>> + Send;

    /// Persists the full ledger, replacing any previous state atomically.
    fn save(&self, ledger: &VersionLedger) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Ledger stored as `.nonodorc.json` in a config directory.
#[derive(Debug, Clone)]
pub struct FileLedgerStore {
    path: PathBuf,
}

impl FileLedgerStore {
    /// A store for the ledger inside `config_dir`.
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(LEDGER_FILE_NAME),
        }
    }

    /// Path of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for FileLedgerStore {
    async fn exists(&self) -> Result<bool> {
        tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| BrunodoError::io("check ledger", &self.path, &e))
    }

    async fn load(&self) -> Result<VersionLedger> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No ledger at {}, starting empty", self.path.display());
                return Ok(VersionLedger::new());
            }
            Err(e) => return Err(BrunodoError::io("read ledger", &self.path, &e)),
        };
        VersionLedger::from_json(&content, &self.path.display().to_string())
    }

    async fn save(&self, ledger: &VersionLedger) -> Result<()> {
        let json = ledger.to_json()?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || atomic_write(&path, json.as_bytes()))
            .await
            .map_err(|e| BrunodoError::WriteFailed {
                path: self.path.display().to_string(),
                cause: e.to_string(),
            })??;
        debug!("Saved ledger to {}", self.path.display());
        Ok(())
    }
}

/// In-memory store holding the serialized ledger.
///
/// Clones share the same storage, so a test can hand one clone to the code
/// under test and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    content: Arc<Mutex<Option<String>>>,
}

impl MemoryLedgerStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with raw JSON content.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Arc::new(Mutex::new(Some(content.into()))),
        }
    }

    /// The raw persisted content, if saved.
    pub fn content(&self) -> Option<String> {
        self.content.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl LedgerStore for MemoryLedgerStore {
    async fn exists(&self) -> Result<bool> {
        Ok(self.content().is_some())
    }

    async fn load(&self) -> Result<VersionLedger> {
        match self.content() {
            Some(content) => VersionLedger::from_json(&content, "<memory>"),
            None => Ok(VersionLedger::new()),
        }
    }

    async fn save(&self, ledger: &VersionLedger) -> Result<()> {
        let json = ledger.to_json()?;
        *self.content.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(json);
        Ok(())
    }
}
