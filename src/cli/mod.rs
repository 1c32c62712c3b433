//! Command-line interface for brunodo.
//!
//! # Commands
//!
//! - `install <VERSION>` - download, verify and record a nonodo version
//! - `run [--version V] [-- ARGS...]` - launch nonodo, provisioning it if needed
//! - `use <VERSION>` - make an installed version the default
//! - `list [--remote]` - show installed or published versions
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - debug logging
//! - `--quiet` / `-q` - errors only
//! - `--no-progress` - hide download progress bars (also `BRUNODO_NO_PROGRESS`)
//! - `--config-dir` / `--data-dir` - override the directories (also `BRUNODO_CONFIG_DIR`, `BRUNODO_DATA_DIR`)
//!
//! `RUST_LOG`, when set, takes precedence over `--verbose` and `--quiet`.

mod common;
mod install;
mod list;
mod run;
mod use_version;

pub use common::CommandContext;
pub use list::{RemoteRow, RemoteTag, remote_rows};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::launcher::ExitOutcome;
use crate::utils::platform::{CONFIG_DIR_ENV, DATA_DIR_ENV};
use crate::utils::progress::NO_PROGRESS_ENV;

/// Runtime settings derived from global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter when `RUST_LOG` is not set.
    pub log_level: &'static str,
    /// Hide progress bars.
    pub no_progress: bool,
    /// Explicit config directory.
    pub config_dir: Option<PathBuf>,
    /// Explicit data directory.
    pub data_dir: Option<PathBuf>,
}

/// Top-level parser.
#[derive(Parser, Debug)]
#[command(
    name = "brunodo",
    about = "Install, manage and run versions of the nonodo development node",
    version,
    long_about = "brunodo downloads verified nonodo releases for this platform, keeps track of installed \
                  versions and runs the selected version in the foreground."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable progress bars
    #[arg(
        long,
        global = true,
        env = NO_PROGRESS_ENV,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    no_progress: bool,

    /// Directory holding the version ledger and config.toml
    #[arg(long, global = true, env = CONFIG_DIR_ENV, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Directory holding downloaded releases
    #[arg(long, global = true, env = DATA_DIR_ENV, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install a specific version
    Install(install::InstallCommand),
    /// Run nonodo
    Run(run::RunCommand),
    /// Set the default version
    Use(use_version::UseCommand),
    /// List installed or published versions
    List(list::ListCommand),
}

impl Cli {
    /// Initializes logging and runs the selected command.
    ///
    /// Returns how the process should exit: `Code(0)` for every command but
    /// `run`, which mirrors the child.
    pub async fn execute(self) -> Result<ExitOutcome> {
        let config = self.build_config();
        init_logging(&config);
        self.execute_with_config(config).await
    }

    /// Derives the runtime settings from the flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };
        CliConfig {
            log_level,
            no_progress: self.no_progress,
            config_dir: self.config_dir.clone(),
            data_dir: self.data_dir.clone(),
        }
    }

    /// Runs the command with explicit settings.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<ExitOutcome> {
        let ctx = CommandContext::load(&config).await?;

        match self.command {
            Commands::Install(cmd) => cmd.execute(&ctx).await.map(|()| ExitOutcome::Code(0)),
            Commands::Run(cmd) => cmd.execute(&ctx).await,
            Commands::Use(cmd) => cmd.execute(&ctx).await.map(|()| ExitOutcome::Code(0)),
            Commands::List(cmd) => cmd.execute(&ctx).await.map(|()| ExitOutcome::Code(0)),
        }
    }
}

/// Installs the global tracing subscriber, writing to stderr.
///
/// A second call (as happens in tests) is a no-op.
pub fn init_logging(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
