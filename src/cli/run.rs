//! Run nonodo, provisioning it first when needed.
//!
//! ```bash
//! brunodo run                          # ledger default, or the pinned version
//! brunodo run --version 2.0.0          # pinned version when no default is set
//! brunodo run -- --http-port 8080      # everything after -- goes to nonodo
//! ```

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info, warn};

use crate::constants::DEFAULT_PINNED_VERSION;
use crate::core::BrunodoError;
use crate::launcher::{ExitOutcome, ProcessLauncher};
use crate::ledger::{LedgerStore, VersionLedger};
use crate::provision::CancelSignal;

use super::common::{CommandContext, InterruptWatcher};

/// Command to launch nonodo in the foreground.
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Version to run when the ledger has no usable default
    #[arg(long = "version", value_name = "VERSION", default_value = DEFAULT_PINNED_VERSION)]
    pub pinned_version: String,

    /// Arguments passed to nonodo unchanged
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl RunCommand {
    /// Provisions and launches nonodo; returns how it exited.
    pub async fn execute(self, ctx: &CommandContext) -> Result<ExitOutcome> {
        let store = ctx.ledger_store();
        let (mut ledger, persist) = match store.load().await {
            Ok(ledger) => (ledger, true),
            Err(e @ BrunodoError::LedgerCorrupt { .. }) => {
                warn!("{e}; continuing without recording versions");
                (VersionLedger::new(), false)
            }
            Err(e) => return Err(e.into()),
        };

        let version = self.select_version(&ledger);
        let provisioner = ctx.provisioner()?;
        info!("Running nonodo {} for {}", version, provisioner.platform());

        // Signal listeners must exist before the interrupt watcher goes away
        let launcher = ProcessLauncher::new()?;
        let cancel = CancelSignal::new();
        let outcome = {
            let _watcher = InterruptWatcher::spawn(cancel.clone());
            provisioner
                .ensure(&cancel, &version)
                .await
                .with_context(|| format!("Failed to provision nonodo {version}"))?
        };

        let recorded = ledger.get(&version).map(|e| e.content_hash.clone());
        let needs_record = match (&recorded, &outcome.hash) {
            (None, _) => true,
            (Some(old), Some(new)) => outcome.downloaded && old != new,
            (Some(_), None) => false,
        };
        if persist && needs_record {
            ledger.add_version(&version, outcome.hash.as_deref().unwrap_or_default());
            store.save(&ledger).await?;
            debug!("Recorded nonodo {} in the ledger", version);
        }

        if cancel.is_cancelled() {
            return Err(BrunodoError::Cancelled.into());
        }
        Ok(launcher.run(&outcome.path, &self.args).await?)
    }

    fn select_version(&self, ledger: &VersionLedger) -> String {
        if let Some(entry) = ledger.usable_default() {
            debug!("Using default version {}", entry.version);
            return entry.version.clone();
        }

        if ledger.has_dangling_default() {
            warn!(
                "Default version {} is not installed; falling back to {}",
                ledger.default_version().unwrap_or_default(),
                self.pinned_version
            );
        } else {
            info!("{}; using {}", BrunodoError::NoUsableDefault, self.pinned_version);
        }
        self.pinned_version.clone()
    }
}
