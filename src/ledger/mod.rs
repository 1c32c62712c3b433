//! Version ledger: which nonodo versions are installed and which is the default.
//!
//! The ledger is persisted as `.nonodorc.json` in the config directory:
//!
//! ```json
//! {
//!   "defaultVersion": "2.1.1-beta",
//!   "versions": [
//!     ["2.1.1-beta", { "hash": "5eb63bbbe01eeed093cb22bb8f5acdc3", "createdAt": "2024-05-01T12:00:00Z" }]
//!   ]
//! }
//! ```
//!
//! `versions` is a list of `[version, record]` pairs in insertion order. An
//! empty `defaultVersion` means no default.
//!
//! # Default policy
//!
//! [`VersionLedger::add_version`] always promotes the added version to the
//! default, even when an older default was chosen explicitly with
//! [`VersionLedger::set_default`]. Installing is treated as "switch to this".
//!
//! # Consistency
//!
//! Mutations keep the invariant that a set default names an entry. A file
//! written by other tools may violate it; such a dangling default is kept as
//! loaded and reported by [`VersionLedger::usable_default`] returning `None`.
//!
//! There is no locking. Concurrent writers against the same config dir are
//! unsupported; the last save wins.

mod store;

pub use store::{FileLedgerStore, LedgerStore, MemoryLedgerStore};

use crate::core::{BrunodoError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One installed version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    /// Version string as installed (no leading `v`).
    pub version: String,
    /// Hex digest of the verified archive.
    pub content_hash: String,
    /// When the version was recorded.
    pub installed_at: DateTime<Utc>,
}

/// In-memory ledger handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionLedger {
    entries: Vec<VersionEntry>,
    default_version: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerFile {
    #[serde(default)]
    default_version: String,
    #[serde(default)]
    versions: Vec<(String, VersionRecord)>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionRecord {
    hash: String,
    created_at: DateTime<Utc>,
}

impl VersionLedger {
    /// An empty ledger with no default.
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[VersionEntry] {
        &self.entries
    }

    /// Whether no version is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry.
    pub fn get(&self, version: &str) -> Option<&VersionEntry> {
        self.entries.iter().find(|e| e.version == version)
    }

    /// Whether `version` is recorded.
    pub fn contains(&self, version: &str) -> bool {
        self.get(version).is_some()
    }

    /// The default version as persisted, which may be dangling.
    pub fn default_version(&self) -> Option<&str> {
        self.default_version.as_deref()
    }

    /// The default entry, if the default names a recorded version.
    pub fn usable_default(&self) -> Option<&VersionEntry> {
        self.default_version.as_deref().and_then(|v| self.get(v))
    }

    /// Whether a default is set but names no recorded version.
    pub fn has_dangling_default(&self) -> bool {
        self.default_version.is_some() && self.usable_default().is_none()
    }

    /// Records `version` with `hash` as installed now and makes it the default.
    pub fn add_version(&mut self, version: &str, hash: &str) -> &VersionEntry {
        self.add_version_at(version, hash, Utc::now())
    }

    /// Records `version` with an explicit timestamp and makes it the default.
    ///
    /// An existing entry for the same version is overwritten in place.
    pub fn add_version_at(&mut self, version: &str, hash: &str, installed_at: DateTime<Utc>) -> &VersionEntry {
        let entry = VersionEntry {
            version: version.to_string(),
            content_hash: hash.to_string(),
            installed_at,
        };

        let index = match self.entries.iter().position(|e| e.version == version) {
            Some(index) => {
                self.entries[index] = entry;
                index
            }
            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            }
        };
        self.default_version = Some(version.to_string());
        &self.entries[index]
    }

    /// Promotes an installed version to the default.
    ///
    /// # Errors
    ///
    /// [`BrunodoError::VersionNotInstalled`] when `version` is not recorded.
    pub fn set_default(&mut self, version: &str) -> Result<()> {
        if !self.contains(version) {
            return Err(BrunodoError::VersionNotInstalled {
                version: version.to_string(),
            });
        }
        self.default_version = Some(version.to_string());
        Ok(())
    }

    /// Parses the persisted JSON form. `source` names the file in errors.
    pub fn from_json(content: &str, source: &str) -> Result<Self> {
        let file: LedgerFile = serde_json::from_str(content).map_err(|e| BrunodoError::LedgerCorrupt {
            path: source.to_string(),
            reason: e.to_string(),
        })?;

        let mut ledger = Self::new();
        for (version, record) in file.versions {
            // later duplicates win, as with a map
            ledger.add_version_at(&version, &record.hash, record.created_at);
        }
        ledger.default_version = Some(file.default_version).filter(|v| !v.is_empty());
        Ok(ledger)
    }

    /// Serializes to the persisted JSON form.
    pub fn to_json(&self) -> Result<String> {
        let file = LedgerFile {
            default_version: self.default_version.clone().unwrap_or_default(),
            versions: self
                .entries
                .iter()
                .map(|e| {
                    (
                        e.version.clone(),
                        VersionRecord {
                            hash: e.content_hash.clone(),
                            created_at: e.installed_at,
                        },
                    )
                })
                .collect(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| BrunodoError::ConfigError {
            message: format!("failed to serialize version ledger: {e}"),
        })
    }
}
