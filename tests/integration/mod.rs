//! Integration test suite for brunodo
//!
//! End-to-end tests that exercise the provisioning pipeline and the CLI
//! against a loopback HTTP server serving real archives. Nothing here
//! touches the network beyond 127.0.0.1.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! RUST_LOG=debug cargo test --test integration -- --nocapture
//! ```
//!
//! # Test Organization
//!
//! - **common**: loopback release server and CLI helpers
//! - **download**: redirects, redirect limit, status errors, cancellation
//! - **provisioning**: download, verify, extract for tar.gz and zip releases
//! - **ledger**: file-backed ledger persistence
//! - **cli**: the `brunodo` binary (`install`, `use`, `list`, `run`)

mod common;

mod cli;
mod download;
mod provisioning;
