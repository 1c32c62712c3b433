//! Switch the default nonodo version.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::ledger::LedgerStore;

use super::common::CommandContext;

/// Command to make an installed version the default for `brunodo run`.
#[derive(Args, Debug)]
pub struct UseCommand {
    /// Installed version to use by default
    pub version: String,
}

impl UseCommand {
    /// Updates the ledger default.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let store = ctx.ledger_store();
        let mut ledger = store.load().await?;
        ledger.set_default(&self.version)?;
        store.save(&ledger).await?;

        println!("{} Default version set to {}", "✓".green().bold(), self.version.bold());
        Ok(())
    }
}
