//! Shared fixtures for the integration suite.
//!
//! [`ReleaseServer`] is a loopback axum server with a few canned routes:
//!
//! - `/releases/*path` - files registered with [`ReleaseServer::put`]
//! - `/redirect/:hops` - a chain of `hops` 302 responses ending in `final`
//! - `/redirect-loop` - redirects to itself forever
//! - `/redirect-absolute/:hops` - like `/redirect` but with absolute locations
//! - `/endless` - a body that never ends
//! - `/status/:code` - an empty response with the given status

// Not every test module uses every helper
#![allow(dead_code)]

use anyhow::Result;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use brunodo_cli::provision::{PlatformTriple, ReleaseDescriptor, describe};
use brunodo_cli::test_utils::fixtures::{fake_nonodo_script, md5_hex, tar_gz_with, zip_with};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Default)]
struct ServerState {
    files: Mutex<HashMap<String, Vec<u8>>>,
    hits: Mutex<HashMap<String, usize>>,
}

/// Loopback HTTP server for release fixtures. Stops when dropped.
pub struct ReleaseServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl ReleaseServer {
    /// Binds an ephemeral port on 127.0.0.1 and starts serving.
    pub async fn start() -> Result<Self> {
        let state = Arc::new(ServerState::default());
        let app = Router::new()
            .route("/releases/*path", get(serve_release))
            .route("/redirect/:hops", get(redirect_chain))
            .route("/redirect-absolute/:hops", get(redirect_absolute))
            .route("/redirect-loop", get(redirect_loop))
            .route("/endless", get(endless))
            .route("/status/:code", get(status))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, state, handle })
    }

    /// Absolute URL of `path` on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Base URL to configure as the release origin.
    pub fn base_url(&self) -> String {
        self.url("/releases")
    }

    /// Serves `bytes` at `/releases/<path>`.
    pub fn put(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        self.state.files.lock().unwrap().insert(path.to_string(), bytes.into());
    }

    /// Number of requests received for `/releases/<path>`.
    pub fn hits(&self, path: &str) -> usize {
        self.state.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Publishes `archive` for `release` with the given `.md5` content.
    pub fn publish(&self, release: &ReleaseDescriptor, archive: Vec<u8>, digest: &str) {
        self.put(&release_path(release), archive);
        self.put(&format!("{}.md5", release_path(release)), digest);
    }

    /// Publishes a working release (the fake nonodo script) for `platform`.
    ///
    /// Returns the descriptor and the archive's md5.
    pub fn publish_fake(&self, version: &str, platform: &PlatformTriple) -> Result<(ReleaseDescriptor, String)> {
        let release = describe(version, platform, &self.base_url())?;
        let script = fake_nonodo_script();
        let archive = if platform.is_windows() {
            zip_with(&[(release.archive_kind.inner_name(), script.as_slice())])
        } else {
            tar_gz_with(&[(release.archive_kind.inner_name(), script.as_slice())])
        };
        let digest = md5_hex(&archive);
        self.publish(&release, archive, &digest);
        Ok((release, digest))
    }
}

impl Drop for ReleaseServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Path of the archive below `/releases`.
pub fn release_path(release: &ReleaseDescriptor) -> String {
    format!("v{}/{}", release.version, release.archive_name)
}

async fn serve_release(State(state): State<Arc<ServerState>>, Path(path): Path<String>) -> Response {
    *state.hits.lock().unwrap().entry(path.clone()).or_default() += 1;
    match state.files.lock().unwrap().get(&path) {
        Some(bytes) => bytes.clone().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn redirect_chain(Path(hops): Path<usize>) -> Response {
    if hops == 0 {
        return "final".into_response();
    }
    (StatusCode::FOUND, [(header::LOCATION, format!("/redirect/{}", hops - 1))]).into_response()
}

async fn redirect_absolute(headers: HeaderMap, Path(hops): Path<usize>) -> Response {
    if hops == 0 {
        return "final".into_response();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("127.0.0.1")
        .to_string();
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, format!("http://{host}/redirect-absolute/{}", hops - 1))],
    )
        .into_response()
}

async fn redirect_loop() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/redirect-loop")]).into_response()
}

async fn endless() -> Response {
    let stream = futures::stream::unfold((), |()| async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Some((Ok::<_, std::io::Error>(Bytes::from_static(&[0u8; 1024])), ()))
    });
    Body::from_stream(stream).into_response()
}

async fn status(Path(code): Path<u16>) -> Response {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR).into_response()
}

/// `brunodo` command with isolated config and data directories.
pub fn brunodo(config_dir: &std::path::Path, data_dir: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("brunodo").unwrap();
    cmd.env("BRUNODO_CONFIG_DIR", config_dir)
        .env("BRUNODO_DATA_DIR", data_dir)
        .env("BRUNODO_NO_PROGRESS", "1")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// Writes a `config.toml` pointing the release origin at `base_url`.
pub fn write_config(config_dir: &std::path::Path, base_url: &str) -> Result<()> {
    std::fs::create_dir_all(config_dir)?;
    std::fs::write(config_dir.join("config.toml"), format!("base_url = \"{base_url}\"\n"))?;
    Ok(())
}
