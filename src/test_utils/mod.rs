//! Test utilities for brunodo
//!
//! Shared by unit tests and the integration suite (through the `test-utils`
//! feature):
//!
//! - [`init_test_logging`] - once-only tracing setup with the test writer
//! - [`fixtures`] - release archives and digests built in memory
//!
//! # Example
//!
//! ```rust,no_run
//! use brunodo_cli::test_utils::{fixtures, init_test_logging};
//!
//! init_test_logging(None);
//! let archive = fixtures::tar_gz_with(&[("nonodo", b"#!/bin/sh\n".as_slice())]);
//! let digest = fixtures::md5_hex(&archive);
//! ```

pub mod fixtures;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging
/// stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
