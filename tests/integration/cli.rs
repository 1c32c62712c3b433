//! The `brunodo` binary end to end.
//!
//! Commands run on the blocking pool so the loopback server keeps serving
//! on the test runtime.

use crate::common::{ReleaseServer, brunodo, write_config};
use anyhow::Result;
use assert_cmd::assert::Assert;
use brunodo_cli::ledger::VersionLedger;
use brunodo_cli::provision::PlatformTriple;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

struct CliEnv {
    config_dir: TempDir,
    data_dir: TempDir,
}

impl CliEnv {
    fn new() -> Result<Self> {
        Ok(Self {
            config_dir: TempDir::new()?,
            data_dir: TempDir::new()?,
        })
    }

    fn command(&self) -> assert_cmd::Command {
        brunodo(self.config_dir.path(), self.data_dir.path())
    }

    async fn run(&self, args: &[&str]) -> Result<Assert> {
        self.run_with(args, &[]).await
    }

    async fn run_with(&self, args: &[&str], envs: &[(&str, &str)]) -> Result<Assert> {
        let mut cmd = self.command();
        cmd.args(args);
        for (key, value) in envs {
            cmd.env(key, value);
        }
        Ok(tokio::task::spawn_blocking(move || cmd.assert()).await?)
    }

    fn ledger(&self) -> Result<VersionLedger> {
        let path = self.config_dir.path().join(".nonodorc.json");
        Ok(VersionLedger::from_json(&std::fs::read_to_string(&path)?, &path.display().to_string())?)
    }
}

/// Serves a fake release for the host, or `None` on hosts without releases.
async fn host_release(env: &CliEnv, version: &str) -> Result<Option<ReleaseServer>> {
    let platform = PlatformTriple::resolve();
    if !platform.is_supported() {
        return Ok(None);
    }
    let server = ReleaseServer::start().await?;
    server.publish_fake(version, &platform)?;
    write_config(env.config_dir.path(), &server.base_url())?;
    Ok(Some(server))
}

/// Help lists every command.
#[test]
fn test_help_lists_commands() {
    let env = CliEnv::new().unwrap();
    env.command()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("install").and(contains("run")).and(contains("use")).and(contains("list")));
}

/// `list` on a fresh config directory explains how to install.
#[test]
fn test_list_without_versions() {
    let env = CliEnv::new().unwrap();
    env.command()
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No versions installed"));
}

/// `BRUNODO_NO_PROGRESS` takes the usual truthy and falsy spellings.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_progress_env_accepts_boolish_values() -> Result<()> {
    let env = CliEnv::new()?;
    for value in ["1", "0", "true", "false", "yes", "off"] {
        env.run_with(&["list"], &[("BRUNODO_NO_PROGRESS", value)])
            .await?
            .success()
            .stdout(contains("No versions installed"));
    }

    env.run_with(&["list"], &[("BRUNODO_NO_PROGRESS", "maybe")])
        .await?
        .code(2)
        .stderr(contains("--no-progress"));
    Ok(())
}

/// `use` rejects a version that is not in the ledger.
#[test]
fn test_use_requires_installed_version() {
    let env = CliEnv::new().unwrap();
    env.command()
        .args(["use", "1.0.0"])
        .assert()
        .code(1)
        .stderr(contains("Version 1.0.0 is not installed").and(contains("brunodo install 1.0.0")));
    assert!(!env.config_dir.path().join(".nonodorc.json").exists());
}

/// `install` validates the version before touching the network.
#[test]
fn test_install_rejects_invalid_version() {
    let env = CliEnv::new().unwrap();
    env.command()
        .args(["install", "latest"])
        .assert()
        .code(1)
        .stderr(contains("Invalid version 'latest'"));
    assert_eq!(std::fs::read_dir(env.data_dir.path()).unwrap().count(), 0);
}

/// A corrupt ledger fails commands that read it.
#[test]
fn test_corrupt_ledger_fails_list() {
    let env = CliEnv::new().unwrap();
    std::fs::write(env.config_dir.path().join(".nonodorc.json"), "[1, 2").unwrap();
    env.command().arg("list").assert().code(1).stderr(contains("corrupt"));
}

/// Unknown keys in config.toml are rejected.
#[test]
fn test_invalid_config_is_reported() {
    let env = CliEnv::new().unwrap();
    std::fs::write(env.config_dir.path().join("config.toml"), "mirror = \"x\"\n").unwrap();
    env.command().arg("list").assert().code(1).stderr(contains("Configuration error"));
}

/// `install` downloads, records the version as default, then short-circuits.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_install_records_default() -> Result<()> {
    let env = CliEnv::new()?;
    let Some(_server) = host_release(&env, "1.0.0").await? else {
        return Ok(());
    };

    env.run(&["install", "1.0.0"])
        .await?
        .success()
        .stdout(contains("Installed nonodo").and(contains("Version 1.0.0 is now the default")));

    let ledger = env.ledger()?;
    assert_eq!(ledger.default_version(), Some("1.0.0"));
    assert_eq!(ledger.get("1.0.0").map(|e| e.content_hash.len()), Some(32));

    env.run(&["install", "1.0.0"])
        .await?
        .success()
        .stdout(contains("Version 1.0.0 already installed"));

    env.run(&["list"]).await?.success().stdout(contains("1.0.0"));
    env.run(&["use", "1.0.0"]).await?.success().stdout(contains("Default version set to"));
    Ok(())
}

/// A release the server does not have fails with the HTTP status.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_install_unpublished_version() -> Result<()> {
    let env = CliEnv::new()?;
    let Some(_server) = host_release(&env, "1.0.0").await? else {
        return Ok(());
    };

    env.run(&["install", "3.0.0"]).await?.code(1).stderr(contains("Error 404"));
    assert!(!env.config_dir.path().join(".nonodorc.json").exists());
    Ok(())
}

/// `run` passes arguments through and exits with the child's code.
#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_mirrors_exit_code_and_arguments() -> Result<()> {
    let env = CliEnv::new()?;
    let Some(_server) = host_release(&env, "1.0.0").await? else {
        return Ok(());
    };
    let args_file = env.data_dir.path().join("args.txt");
    let args_file_str = args_file.display().to_string();

    env.run_with(
        &["run", "--version", "1.0.0", "--", "--http-port", "9000"],
        &[("BRUNODO_FAKE_ARGS_FILE", args_file_str.as_str()), ("BRUNODO_FAKE_EXIT", "3")],
    )
    .await?
    .code(3);

    assert_eq!(std::fs::read_to_string(&args_file)?, "--http-port\n9000\n");
    // The pinned version was provisioned and recorded
    assert_eq!(env.ledger()?.default_version(), Some("1.0.0"));
    Ok(())
}

/// `run` prefers the ledger default over the pinned version.
#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_uses_ledger_default() -> Result<()> {
    let env = CliEnv::new()?;
    let Some(_server) = host_release(&env, "1.0.0").await? else {
        return Ok(());
    };

    env.run(&["install", "1.0.0"]).await?.success();
    // 9.9.9 is not published; selecting it would fail
    env.run(&["run", "--version", "9.9.9"]).await?.success();
    Ok(())
}

/// A child killed by a signal takes brunodo down with the same signal.
#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_reraises_child_signal() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    use std::os::unix::process::ExitStatusExt;

    let platform = PlatformTriple::resolve();
    if !platform.is_supported() {
        return Ok(());
    }
    let env = CliEnv::new()?;
    // An executable already in place is used without any download
    let release = brunodo_cli::provision::describe("1.0.0", &platform, "http://127.0.0.1:1")?;
    let binary = env.data_dir.path().join(&release.binary_name);
    std::fs::write(&binary, "#!/bin/sh\nkill -TERM $$\n")?;
    std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))?;

    let assert = env.run(&["run", "--version", "1.0.0"]).await?;
    let status = assert.get_output().status;
    assert_eq!(status.signal(), Some(libc::SIGTERM), "status: {status:?}");
    assert_eq!(status.code(), None);
    Ok(())
}
