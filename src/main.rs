//! brunodo command-line entry point.

use anyhow::Result;
use brunodo_cli::cli;
use brunodo_cli::core::user_friendly_error;
use brunodo_cli::launcher::{ExitOutcome, exit_like};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(ExitOutcome::Code(0)) => Ok(()),
        Ok(outcome) => exit_like(outcome),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
