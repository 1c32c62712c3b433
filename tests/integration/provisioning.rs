//! Provisioning pipeline end to end: lookup, download, verify, extract.

use crate::common::{ReleaseServer, release_path};
use anyhow::Result;
use brunodo_cli::core::BrunodoError;
use brunodo_cli::provision::{
    CancelSignal, Downloader, DownloaderConfig, HashAlgorithm, PlatformTriple, Provisioner, ProvisionerConfig,
    describe,
};
use brunodo_cli::test_utils::fixtures::{fake_nonodo_script, md5_hex, sha256_hex, tar_gz_with};
use brunodo_cli::test_utils::init_test_logging;
use brunodo_cli::utils::ProgressReporter;
use std::path::Path;
use tempfile::TempDir;

fn provisioner(server: &ReleaseServer, install_dir: &Path, platform: PlatformTriple) -> Result<Provisioner> {
    provisioner_with(server, install_dir, platform, HashAlgorithm::Md5, false)
}

fn provisioner_with(
    server: &ReleaseServer,
    install_dir: &Path,
    platform: PlatformTriple,
    hash_algorithm: HashAlgorithm,
    verify_installed: bool,
) -> Result<Provisioner> {
    let downloader = Downloader::with_config(DownloaderConfig::default(), ProgressReporter::hidden())?;
    let config = ProvisionerConfig {
        base_url: server.base_url(),
        install_dir: install_dir.to_path_buf(),
        hash_algorithm,
        verify_installed,
    };
    Ok(Provisioner::new(downloader, config).with_platform(platform))
}

/// A tar.gz release is downloaded, verified and its executable extracted.
#[tokio::test]
async fn test_provision_tar_gz_release() -> Result<()> {
    init_test_logging(None);
    let server = ReleaseServer::start().await?;
    let platform = PlatformTriple::from_host_ids("linux", "x86_64");
    let (release, digest) = server.publish_fake("1.2.3", &platform)?;
    let temp_dir = TempDir::new()?;

    let outcome = provisioner(&server, temp_dir.path(), platform)?
        .ensure(&CancelSignal::new(), "1.2.3")
        .await?;

    assert_eq!(outcome.path, temp_dir.path().join("nonodo-v1.2.3-linux-amd64"));
    assert_eq!(outcome.hash.as_deref(), Some(digest.as_str()));
    assert!(outcome.downloaded);
    assert_eq!(std::fs::read(&outcome.path)?, fake_nonodo_script());
    assert!(temp_dir.path().join(&release.archive_name).exists());
    assert!(temp_dir.path().join(release.digest_file_name(HashAlgorithm::Md5)).exists());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&outcome.path)?.permissions().mode();
        assert_eq!(mode & 0o111, 0o111, "executable bits not set: {mode:o}");
    }
    Ok(())
}

/// Windows releases are zip archives holding `nonodo.exe`.
#[tokio::test]
async fn test_provision_zip_release() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let platform = PlatformTriple::from_host_ids("windows", "x86_64");
    let (release, _) = server.publish_fake("2.1.1-beta", &platform)?;
    assert_eq!(release.archive_name, "nonodo-v2.1.1-beta-windows-amd64.zip");
    let temp_dir = TempDir::new()?;

    let outcome = provisioner(&server, temp_dir.path(), platform)?
        .ensure(&CancelSignal::new(), "2.1.1-beta")
        .await?;

    assert_eq!(outcome.path, temp_dir.path().join("nonodo-v2.1.1-beta-windows-amd64.exe"));
    assert_eq!(std::fs::read(&outcome.path)?, fake_nonodo_script());
    Ok(())
}

/// A second ensure reuses the executable without touching the server.
#[tokio::test]
async fn test_existing_executable_skips_download() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let platform = PlatformTriple::from_host_ids("darwin", "aarch64");
    let (release, _) = server.publish_fake("1.0.0", &platform)?;
    let temp_dir = TempDir::new()?;
    let provisioner = provisioner(&server, temp_dir.path(), platform)?;
    let cancel = CancelSignal::new();

    let first = provisioner.ensure(&cancel, "1.0.0").await?;
    let second = provisioner.ensure(&cancel, "1.0.0").await?;

    assert!(first.downloaded);
    assert!(!second.downloaded);
    assert_eq!(second.hash, None);
    assert_eq!(first.path, second.path);
    assert_eq!(server.hits(&release_path(&release)), 1);
    Ok(())
}

/// With `verify_installed`, a matching cache is accepted and hashed.
#[tokio::test]
async fn test_verify_installed_uses_cache() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let platform = PlatformTriple::from_host_ids("linux", "arm64");
    let (release, digest) = server.publish_fake("1.0.0", &platform)?;
    let temp_dir = TempDir::new()?;
    let provisioner = provisioner_with(&server, temp_dir.path(), platform, HashAlgorithm::Md5, true)?;
    let cancel = CancelSignal::new();

    provisioner.ensure(&cancel, "1.0.0").await?;
    let second = provisioner.ensure(&cancel, "1.0.0").await?;

    assert!(!second.downloaded);
    assert_eq!(second.hash.as_deref(), Some(digest.as_str()));
    assert_eq!(server.hits(&release_path(&release)), 1);
    Ok(())
}

/// A digest that does not match removes the archive and installs nothing.
#[tokio::test]
async fn test_hash_mismatch_removes_archive() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let platform = PlatformTriple::from_host_ids("linux", "amd64");
    let release = describe("1.0.0", &platform, &server.base_url())?;
    let archive = tar_gz_with(&[("nonodo", fake_nonodo_script().as_slice())]);
    server.publish(&release, archive, "00000000000000000000000000000000");
    let temp_dir = TempDir::new()?;

    let err = provisioner(&server, temp_dir.path(), platform)?
        .ensure(&CancelSignal::new(), "1.0.0")
        .await
        .unwrap_err();

    assert!(matches!(err, BrunodoError::HashMismatch { .. }), "got {err:?}");
    assert!(!temp_dir.path().join(&release.archive_name).exists());
    assert!(!temp_dir.path().join(&release.binary_name).exists());
    Ok(())
}

/// The published digest may carry a trailing newline.
#[tokio::test]
async fn test_digest_with_trailing_newline() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let platform = PlatformTriple::from_host_ids("linux", "x86_64");
    let release = describe("1.0.0", &platform, &server.base_url())?;
    let archive = tar_gz_with(&[("nonodo", fake_nonodo_script().as_slice())]);
    let digest = md5_hex(&archive);
    server.publish(&release, archive, &format!("{digest}\n"));
    let temp_dir = TempDir::new()?;

    let outcome = provisioner(&server, temp_dir.path(), platform)?
        .ensure(&CancelSignal::new(), "1.0.0")
        .await?;

    assert_eq!(outcome.hash, Some(digest));
    Ok(())
}

/// SHA-256 verification reads the `.sha256` sidecar.
#[tokio::test]
async fn test_sha256_verification() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let platform = PlatformTriple::from_host_ids("linux", "x86_64");
    let release = describe("1.0.0", &platform, &server.base_url())?;
    let archive = tar_gz_with(&[("nonodo", fake_nonodo_script().as_slice())]);
    let digest = sha256_hex(&archive);
    server.put(&release_path(&release), archive);
    server.put(&format!("{}.sha256", release_path(&release)), digest.clone());
    let temp_dir = TempDir::new()?;

    let outcome = provisioner_with(&server, temp_dir.path(), platform, HashAlgorithm::Sha256, false)?
        .ensure(&CancelSignal::new(), "1.0.0")
        .await?;

    assert_eq!(outcome.hash, Some(digest));
    assert!(temp_dir.path().join(release.digest_file_name(HashAlgorithm::Sha256)).exists());
    Ok(())
}

/// An archive without the `nonodo` entry fails with EntryNotFound.
#[tokio::test]
async fn test_archive_without_executable() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let platform = PlatformTriple::from_host_ids("linux", "x86_64");
    let release = describe("1.0.0", &platform, &server.base_url())?;
    let archive = tar_gz_with(&[("README.md", b"# nonodo".as_slice())]);
    let digest = md5_hex(&archive);
    server.publish(&release, archive, &digest);
    let temp_dir = TempDir::new()?;

    let err = provisioner(&server, temp_dir.path(), platform)?
        .ensure(&CancelSignal::new(), "1.0.0")
        .await
        .unwrap_err();

    assert!(matches!(err, BrunodoError::EntryNotFound { ref entry, .. } if entry == "nonodo"), "got {err:?}");
    assert!(!temp_dir.path().join(&release.binary_name).exists());
    Ok(())
}

/// A version that was never published fails with the HTTP status.
#[tokio::test]
async fn test_unpublished_version() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let temp_dir = TempDir::new()?;

    let err = provisioner(&server, temp_dir.path(), PlatformTriple::from_host_ids("linux", "x86_64"))?
        .ensure(&CancelSignal::new(), "9.9.9")
        .await
        .unwrap_err();

    assert!(matches!(err, BrunodoError::DownloadFailed { status_code: 404, .. }), "got {err:?}");
    Ok(())
}

/// Unsupported platforms fail before any request is made.
#[tokio::test]
async fn test_unsupported_platform() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let platform = PlatformTriple::from_host_ids("freebsd", "x86_64");
    let temp_dir = TempDir::new()?;

    let err = provisioner(&server, temp_dir.path(), platform)?
        .ensure(&CancelSignal::new(), "1.0.0")
        .await
        .unwrap_err();

    match err {
        BrunodoError::UnsupportedPlatform { platform, .. } => assert_eq!(platform, "freebsd-amd64"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(std::fs::read_dir(temp_dir.path())?.count(), 0);
    Ok(())
}

/// A pre-cancelled signal stops provisioning with Cancelled.
#[tokio::test]
async fn test_cancelled_provisioning() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let platform = PlatformTriple::from_host_ids("linux", "x86_64");
    server.publish_fake("1.0.0", &platform)?;
    let temp_dir = TempDir::new()?;
    let cancel = CancelSignal::new();
    cancel.cancel();

    let err = provisioner(&server, temp_dir.path(), platform)?
        .ensure(&cancel, "1.0.0")
        .await
        .unwrap_err();

    assert_eq!(err, BrunodoError::Cancelled);
    assert!(!temp_dir.path().join("nonodo-v1.0.0-linux-amd64").exists());
    Ok(())
}
