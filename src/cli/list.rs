//! List installed and published nonodo versions.
//!
//! ```bash
//! brunodo list            # versions recorded in the ledger
//! brunodo list --remote   # tags published on GitHub, with install status
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Deserialize;

use crate::constants::TAGS_URL;
use crate::ledger::{LedgerStore, VersionLedger};
use crate::provision::CancelSignal;

use super::common::{CommandContext, InterruptWatcher};

/// Command to display versions.
#[derive(Args, Debug)]
pub struct ListCommand {
    /// Query published releases instead of the local ledger
    #[arg(long)]
    pub remote: bool,
}

/// A tag as returned by the GitHub tags API.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTag {
    /// Tag name, usually `v<semver>`
    pub name: String,
    /// Tagged commit
    pub commit: TagCommit,
}

/// Commit reference of a tag.
#[derive(Debug, Clone, Deserialize)]
pub struct TagCommit {
    /// Commit sha
    pub sha: String,
}

/// One row of `list --remote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRow {
    /// Version without the leading `v`; empty when the tag is not semver
    pub version: String,
    /// Commit sha
    pub sha_commit: String,
    /// Whether the ledger records this version
    pub installed: bool,
}

impl ListCommand {
    /// Prints the requested listing.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let ledger = ctx.ledger_store().load().await?;
        if self.remote {
            let downloader = ctx.downloader()?;
            let cancel = CancelSignal::new();
            let tags: Vec<RemoteTag> = {
                let _watcher = InterruptWatcher::spawn(cancel.clone());
                downloader
                    .fetch_json(TAGS_URL, &cancel)
                    .await
                    .context("Failed to list published nonodo versions")?
            };
            print_remote(&remote_rows(&tags, &ledger));
        } else {
            print_installed(&ledger);
        }
        Ok(())
    }
}

/// Joins published tags with the ledger.
pub fn remote_rows(tags: &[RemoteTag], ledger: &VersionLedger) -> Vec<RemoteRow> {
    tags.iter()
        .map(|tag| {
            let name = tag.name.strip_prefix('v').unwrap_or(&tag.name);
            let version = semver::Version::parse(name).map(|v| v.to_string()).unwrap_or_default();
            let installed = !version.is_empty() && ledger.contains(&version);
            RemoteRow {
                version,
                sha_commit: tag.commit.sha.clone(),
                installed,
            }
        })
        .collect()
}

fn print_installed(ledger: &VersionLedger) {
    if ledger.is_empty() {
        println!("No versions installed. Run 'brunodo install <VERSION>' to install one.");
        return;
    }

    println!(
        "  {:<20} {:<34} {:<25}",
        "Version".cyan().bold(),
        "Hash".cyan().bold(),
        "Installed at".cyan().bold()
    );
    println!("{}", "-".repeat(82).bright_black());

    let default = ledger.usable_default().map(|e| e.version.as_str());
    for entry in ledger.entries() {
        let marker = if Some(entry.version.as_str()) == default { "*".green().bold() } else { " ".normal() };
        let hash = if entry.content_hash.is_empty() { "-" } else { entry.content_hash.as_str() };
        println!(
            "{} {:<20} {:<34} {:<25}",
            marker,
            entry.version,
            hash.bright_black(),
            entry.installed_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
}

fn print_remote(rows: &[RemoteRow]) {
    println!(
        "{:<20} {:<42} {:<9}",
        "Version".cyan().bold(),
        "Commit".cyan().bold(),
        "Installed".cyan().bold()
    );
    println!("{}", "-".repeat(73).bright_black());

    for row in rows {
        let installed = if row.installed { "yes".green() } else { "no".normal() };
        println!("{:<20} {:<42} {:<9}", row.version, row.sha_commit.bright_black(), installed);
    }
}
