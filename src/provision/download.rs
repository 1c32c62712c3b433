//! Retrieving client: HTTP GET with bounded redirects and cancellation.
//!
//! Redirects are followed by hand rather than by `reqwest`, so the hop limit
//! is enforced (and reported as [`BrunodoError::TooManyRedirects`]) in one
//! place and every hop observes the [`CancelSignal`].
//!
//! Requests are never retried. A failure of any kind fails the fetch.

use crate::constants::{CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, MAX_REDIRECTS, USER_AGENT};
use crate::core::{BrunodoError, Result};
use crate::provision::cancel::CancelSignal;
use crate::utils::fs::atomic_write;
use crate::utils::progress::ProgressReporter;
use reqwest::header::LOCATION;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the [`Downloader`].
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Maximum idle time while waiting for response data.
    pub read_timeout: Duration,
    /// Maximum number of redirect hops per request.
    pub max_redirects: usize,
    /// User agent string.
    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_redirects: MAX_REDIRECTS,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// Byte accounting for one request, including its followed redirects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadTransfer {
    /// `Content-Length` of the final response, when announced.
    pub expected_length: Option<u64>,
    /// Bytes of body received so far.
    pub bytes_received: u64,
}

impl DownloadTransfer {
    fn record(&mut self, len: usize) {
        self.bytes_received += len as u64;
    }
}

/// HTTP client for release artifacts.
#[derive(Clone)]
pub struct Downloader {
    client: reqwest::Client,
    config: DownloaderConfig,
    progress: ProgressReporter,
}

impl Downloader {
    /// Creates a downloader with custom configuration.
    ///
    /// # Errors
    ///
    /// [`BrunodoError::ConfigError`] if the HTTP client cannot be built
    /// (for example when no TLS backend is available).
    pub fn with_config(config: DownloaderConfig, progress: ProgressReporter) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| BrunodoError::ConfigError {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            config,
            progress,
        })
    }

    /// Fetches `url` into memory.
    ///
    /// - 2xx: the body is streamed; a byte progress bar is drawn when the
    ///   response announces its length
    /// - 3xx with `Location`: the location is resolved against the current
    ///   URL and requested, up to `max_redirects` hops
    /// - anything else: [`BrunodoError::DownloadFailed`]
    ///
    /// Triggering `cancel` at any point drops the connection and fails with
    /// [`BrunodoError::Cancelled`].
    pub async fn fetch(&self, url: &str, cancel: &CancelSignal) -> Result<Vec<u8>> {
        let (body, _) = self.fetch_with_transfer(url, cancel).await?;
        Ok(body)
    }

    /// Like [`fetch`](Self::fetch), also returning the byte accounting.
    pub async fn fetch_with_transfer(
        &self,
        url: &str,
        cancel: &CancelSignal,
    ) -> Result<(Vec<u8>, DownloadTransfer)> {
        let response = self.follow(url, cancel).await?;
        self.read_body(response, cancel).await
    }

    /// Fetches `url` and writes the body atomically to `dest`.
    pub async fn fetch_to_file(&self, url: &str, dest: &Path, cancel: &CancelSignal) -> Result<DownloadTransfer> {
        let (body, transfer) = self.fetch_with_transfer(url, cancel).await?;

        let dest_owned = dest.to_path_buf();
        tokio::task::spawn_blocking(move || atomic_write(&dest_owned, &body))
            .await
            .map_err(|e| BrunodoError::WriteFailed {
                path: dest.display().to_string(),
                cause: e.to_string(),
            })??;

        info!("Downloaded {} ({} bytes)", dest.display(), transfer.bytes_received);
        Ok(transfer)
    }

    /// Fetches `url` and decodes the body as JSON.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str, cancel: &CancelSignal) -> Result<T> {
        let body = self.fetch(url, cancel).await?;
        serde_json::from_slice(&body).map_err(|e| BrunodoError::NetworkError {
            url: url.to_string(),
            cause: format!("invalid JSON response: {e}"),
        })
    }

    async fn follow(&self, url: &str, cancel: &CancelSignal) -> Result<Response> {
        let mut current = Url::parse(url).map_err(|e| BrunodoError::NetworkError {
            url: url.to_string(),
            cause: format!("invalid URL: {e}"),
        })?;
        let mut hops = 0usize;

        loop {
            if cancel.is_cancelled() {
                return Err(BrunodoError::Cancelled);
            }
            debug!("GET {}", current);

            let response = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(BrunodoError::Cancelled),
                sent = self.client.get(current.clone()).send() => sent.map_err(|e| network_error(&current, &e))?,
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let location = status
                .is_redirection()
                .then(|| response.headers().get(LOCATION))
                .flatten()
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            let Some(location) = location else {
                return Err(BrunodoError::DownloadFailed {
                    url: current.to_string(),
                    status_code: status.as_u16(),
                    status_message: status.canonical_reason().unwrap_or("Unknown").to_string(),
                });
            };

            if hops >= self.config.max_redirects {
                return Err(BrunodoError::TooManyRedirects {
                    url: url.to_string(),
                    limit: self.config.max_redirects,
                });
            }
            hops += 1;

            let next = current.join(&location).map_err(|e| BrunodoError::NetworkError {
                url: current.to_string(),
                cause: format!("invalid redirect location '{location}': {e}"),
            })?;
            debug!("Redirect {} ({}) -> {}", hops, status.as_u16(), next);
            current = next;
        }
    }

    async fn read_body(&self, mut response: Response, cancel: &CancelSignal) -> Result<(Vec<u8>, DownloadTransfer)> {
        let url = response.url().clone();
        let mut transfer = DownloadTransfer {
            expected_length: response.content_length(),
            bytes_received: 0,
        };

        let label = url.path_segments().and_then(|mut s| s.next_back()).unwrap_or("download").to_string();
        let bar = match transfer.expected_length {
            Some(len) => self.progress.bytes(len, label),
            None => self.progress.spinner(label),
        };

        let capacity = transfer.expected_length.unwrap_or(0).min(64 * 1024 * 1024);
        let mut body = Vec::with_capacity(usize::try_from(capacity).unwrap_or(0));

        loop {
            let chunk = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    bar.abandon();
                    return Err(BrunodoError::Cancelled);
                }
                chunk = response.chunk() => chunk.map_err(|e| {
                    bar.abandon();
                    network_error(&url, &e)
                })?,
            };

            match chunk {
                Some(bytes) => {
                    transfer.record(bytes.len());
                    bar.inc(bytes.len() as u64);
                    body.extend_from_slice(&bytes);
                }
                None => break,
            }
        }

        bar.finish_and_clear();
        debug!("Fetched {} bytes from {}", transfer.bytes_received, url);
        Ok((body, transfer))
    }
}

fn network_error(url: &Url, err: &reqwest::Error) -> BrunodoError {
    let cause = if err.is_timeout() {
        format!("timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    BrunodoError::NetworkError {
        url: url.to_string(),
        cause,
    }
}
