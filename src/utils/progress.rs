//! Progress indicators for downloads.
//!
//! Thin wrapper over `indicatif` with consistent styling. Bars are hidden when
//! the reporter is created disabled or when the caller asks for a hidden bar.
//! The CLI disables it for `--no-progress`, which also reads a boolish
//! `BRUNODO_NO_PROGRESS`.
//!
//! Progress is purely observational: nothing in the provisioning pipeline
//! depends on what a bar displays.

use indicatif::{MultiProgress, ProgressBar as IndicatifBar, ProgressStyle};
use std::time::Duration;

/// Environment variable backing `--no-progress`.
pub const NO_PROGRESS_ENV: &str = "BRUNODO_NO_PROGRESS";

/// Factory for progress bars sharing one terminal region.
///
/// Concurrent downloads (digest and archive) draw their bars through the
/// same [`MultiProgress`] so they do not overwrite each other.
#[derive(Clone)]
pub struct ProgressReporter {
    multi: Option<MultiProgress>,
}

impl ProgressReporter {
    /// Creates a reporter. When `enabled` is false every bar it hands out is hidden.
    pub fn new(enabled: bool) -> Self {
        let multi = enabled.then(MultiProgress::new);
        Self { multi }
    }

    /// A reporter that never draws anything.
    pub fn hidden() -> Self {
        Self { multi: None }
    }

    /// Whether bars from this reporter are drawn.
    pub fn is_enabled(&self) -> bool {
        self.multi.is_some()
    }

    /// Creates a byte-counting bar of `total` bytes.
    pub fn bytes(&self, total: u64, label: impl Into<String>) -> ProgressBar {
        let Some(multi) = &self.multi else {
            return ProgressBar::hidden();
        };
        let bar = multi.add(IndicatifBar::new(total));
        bar.set_style(bytes_style());
        bar.set_message(label.into());
        ProgressBar { inner: bar }
    }

    /// Creates a spinner for transfers of unknown length.
    pub fn spinner(&self, label: impl Into<String>) -> ProgressBar {
        let Some(multi) = &self.multi else {
            return ProgressBar::hidden();
        };
        let bar = multi.add(IndicatifBar::new_spinner());
        bar.set_style(spinner_style());
        bar.set_message(label.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        ProgressBar { inner: bar }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::hidden()
    }
}

/// A single progress indicator.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// A bar that silently ignores all updates.
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    /// Advances the bar by `delta` units.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Sets the absolute position.
    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos);
    }

    /// Current position.
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Replaces the message shown next to the bar.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Finishes and removes the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }

    /// Leaves the bar in place with an abandoned state (used on errors).
    pub fn abandon(&self) {
        self.inner.abandon();
    }
}

fn bytes_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg:.bold} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸━")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg:.bold} {bytes}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}
