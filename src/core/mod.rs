//! Core types for brunodo
//!
//! This module holds the error system shared by every other module:
//! - **Strongly-typed errors** ([`BrunodoError`]) for precise matching in code and tests
//! - **User-friendly contexts** ([`ErrorContext`]) with actionable suggestions for CLI users
//!
//! The provisioning core returns [`Result`] with a typed error. The CLI layer
//! wraps those in `anyhow` with additional context and converts them back to
//! an [`ErrorContext`] via [`user_friendly_error`] right before exiting.

pub mod error;

pub use error::{BrunodoError, ErrorContext, Result, user_friendly_error};
