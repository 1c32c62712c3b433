//! Retrieving client behavior against the loopback server.

use crate::common::ReleaseServer;
use anyhow::Result;
use brunodo_cli::core::BrunodoError;
use brunodo_cli::provision::{CancelSignal, Downloader, DownloaderConfig};
use brunodo_cli::utils::ProgressReporter;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn downloader(max_redirects: usize) -> Result<Downloader> {
    let config = DownloaderConfig {
        max_redirects,
        ..DownloaderConfig::default()
    };
    Ok(Downloader::with_config(config, ProgressReporter::hidden())?)
}

/// A 302 -> 302 -> 200 chain yields the final body.
#[tokio::test]
async fn test_follows_relative_redirects() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let body = downloader(10)?.fetch(&server.url("/redirect/2"), &CancelSignal::new()).await?;
    assert_eq!(body, b"final");
    Ok(())
}

/// Absolute `Location` headers are followed as well.
#[tokio::test]
async fn test_follows_absolute_redirects() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let body = downloader(10)?
        .fetch(&server.url("/redirect-absolute/3"), &CancelSignal::new())
        .await?;
    assert_eq!(body, b"final");
    Ok(())
}

/// Exactly `max_redirects` hops are allowed; one more fails.
#[tokio::test]
async fn test_redirect_limit_is_inclusive() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let cancel = CancelSignal::new();

    let body = downloader(10)?.fetch(&server.url("/redirect/10"), &cancel).await?;
    assert_eq!(body, b"final");

    let url = server.url("/redirect/11");
    let err = downloader(10)?.fetch(&url, &cancel).await.unwrap_err();
    assert_eq!(err, BrunodoError::TooManyRedirects { url, limit: 10 });
    Ok(())
}

/// A redirect loop terminates with TooManyRedirects instead of spinning.
#[tokio::test]
async fn test_redirect_loop_is_bounded() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let err = downloader(3)?
        .fetch(&server.url("/redirect-loop"), &CancelSignal::new())
        .await
        .unwrap_err();
    assert!(matches!(err, BrunodoError::TooManyRedirects { limit: 3, .. }), "got {err:?}");
    Ok(())
}

/// Non-success statuses surface the code and reason.
#[tokio::test]
async fn test_error_status_is_download_failed() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let cancel = CancelSignal::new();

    let err = downloader(10)?.fetch(&server.url("/status/404"), &cancel).await.unwrap_err();
    match err {
        BrunodoError::DownloadFailed {
            status_code,
            status_message,
            ..
        } => {
            assert_eq!(status_code, 404);
            assert_eq!(status_message, "Not Found");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // A redirect status without a Location header is a failure too
    let err = downloader(10)?.fetch(&server.url("/status/302"), &cancel).await.unwrap_err();
    assert!(matches!(err, BrunodoError::DownloadFailed { status_code: 302, .. }), "got {err:?}");
    Ok(())
}

/// Cancelling during an endless body aborts the fetch promptly.
#[tokio::test]
async fn test_cancel_during_body() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let cancel = CancelSignal::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        downloader(10)?.fetch(&server.url("/endless"), &cancel),
    )
    .await?;

    assert_eq!(result.unwrap_err(), BrunodoError::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(10));
    Ok(())
}

/// `fetch_to_file` writes the body and reports the byte count.
#[tokio::test]
async fn test_fetch_to_file() -> Result<()> {
    let server = ReleaseServer::start().await?;
    server.put("v1.0.0/notes.txt", b"release notes".to_vec());
    let temp_dir = TempDir::new()?;
    let dest = temp_dir.path().join("notes.txt");

    let transfer = downloader(10)?
        .fetch_to_file(&server.url("/releases/v1.0.0/notes.txt"), &dest, &CancelSignal::new())
        .await?;

    assert_eq!(transfer.bytes_received, 13);
    assert_eq!(transfer.expected_length, Some(13));
    assert_eq!(std::fs::read(&dest)?, b"release notes");
    assert!(!temp_dir.path().join("notes.txt.tmp").exists());
    Ok(())
}

/// A failed fetch leaves no destination file behind.
#[tokio::test]
async fn test_failed_fetch_writes_nothing() -> Result<()> {
    let server = ReleaseServer::start().await?;
    let temp_dir = TempDir::new()?;
    let dest = temp_dir.path().join("missing.tar.gz");

    let result = downloader(10)?
        .fetch_to_file(&server.url("/releases/v1.0.0/missing.tar.gz"), &dest, &CancelSignal::new())
        .await;

    assert!(result.is_err());
    assert!(!dest.exists());
    Ok(())
}
