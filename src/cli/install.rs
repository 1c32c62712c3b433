//! Install a specific nonodo version.
//!
//! ```bash
//! brunodo install 2.1.1-beta
//! ```
//!
//! The version becomes the new default, even when another default was chosen
//! before with `brunodo use`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::{info, warn};

use crate::ledger::LedgerStore;
use crate::provision::{CancelSignal, release::parse_version};

use super::common::{CommandContext, InterruptWatcher};

/// Command to download, verify and record a nonodo version.
#[derive(Args, Debug)]
pub struct InstallCommand {
    /// Version to install, as a semantic version without a leading 'v' (e.g. 2.1.1-beta)
    pub version: String,
}

impl InstallCommand {
    /// Runs the installation.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        parse_version(&self.version)?;

        let store = ctx.ledger_store();
        let mut ledger = store.load().await?;
        if ledger.contains(&self.version) {
            println!("Version {} already installed", self.version);
            return Ok(());
        }

        let provisioner = ctx.provisioner()?;
        info!("Installing nonodo {} for {}", self.version, provisioner.platform());

        let cancel = CancelSignal::new();
        let outcome = {
            let _watcher = InterruptWatcher::spawn(cancel.clone());
            provisioner
                .ensure(&cancel, &self.version)
                .await
                .with_context(|| format!("Failed to install nonodo {}", self.version))?
        };

        let hash = outcome.hash.unwrap_or_else(|| {
            warn!("Reusing {} without a verified hash", outcome.path.display());
            String::new()
        });
        ledger.add_version(&self.version, &hash);
        store.save(&ledger).await?;

        println!(
            "{} Installed nonodo {} ({})",
            "✓".green().bold(),
            self.version.bold(),
            if hash.is_empty() { "no hash" } else { hash.as_str() }
        );
        println!("Version {} is now the default", self.version);
        Ok(())
    }
}
