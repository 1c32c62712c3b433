//! Process launcher: runs nonodo in the foreground and relays signals.
//!
//! The child inherits stdin, stdout and stderr and receives exactly the
//! arguments it is given. While it runs, an interrupt delivered to brunodo is
//! forwarded as an interrupt followed by a terminate request. The relay is an
//! explicit state machine ([`SignalRelay`]):
//!
//! ```text
//! Running --interrupt--> InterruptReceived --(forward INT, TERM)--> TerminateSent
//!    |                                                                  |
//!    +------------------------- child exits ---------------------------+--> Exited
//! ```
//!
//! When the child is gone, [`exit_like`] makes brunodo end the same way: with
//! the child's exit code, or by re-raising the signal that killed it.

mod relay;

pub use relay::{ChildSignal, RelayState, SignalRelay};

use crate::core::{BrunodoError, Result};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// How the child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Normal exit with a status code.
    Code(i32),
    /// Killed by a signal (Unix only).
    Signal(i32),
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Code(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signal(signal);
            }
        }
        Self::Code(1)
    }
}

/// Spawns an executable and supervises it until it exits.
///
/// Signal listeners are installed by [`ProcessLauncher::new`], so interrupts
/// that arrive between construction and [`ProcessLauncher::run`] are queued
/// and forwarded to the child once it is running.
pub struct ProcessLauncher {
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
    #[cfg(windows)]
    ctrl_c: tokio::signal::windows::CtrlC,
}

impl ProcessLauncher {
    /// Installs the signal listeners used while the child runs.
    ///
    /// # Errors
    ///
    /// [`BrunodoError::IoError`] if a listener cannot be registered.
    pub fn new() -> Result<Self> {
        let listener_failed = |signal: &str, cause: std::io::Error| BrunodoError::IoError {
            operation: "install signal listener".to_string(),
            path: signal.to_string(),
            cause: cause.to_string(),
        };

        #[cfg(unix)]
        let launcher = {
            use tokio::signal::unix::{SignalKind, signal};
            Self {
                sigint: signal(SignalKind::interrupt()).map_err(|e| listener_failed("SIGINT", e))?,
                sigterm: signal(SignalKind::terminate()).map_err(|e| listener_failed("SIGTERM", e))?,
            }
        };

        #[cfg(windows)]
        let launcher = Self {
            ctrl_c: tokio::signal::windows::ctrl_c().map_err(|e| listener_failed("Ctrl-C", e))?,
        };

        Ok(launcher)
    }

    /// Runs `path` with `args` in the foreground and waits for it.
    ///
    /// # Errors
    ///
    /// [`BrunodoError::SpawnFailed`] if the process cannot be started or
    /// waited on.
    pub async fn run(mut self, path: &Path, args: &[String]) -> Result<ExitOutcome> {
        let spawn_failed = |cause: String| BrunodoError::SpawnFailed {
            path: path.display().to_string(),
            cause,
        };

        info!("Launching {}", path.display());
        debug!("Arguments: {:?}", args);
        let mut child = Command::new(path)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| spawn_failed(e.to_string()))?;

        let mut relay = SignalRelay::new();

        #[cfg(unix)]
        let outcome = loop {
            tokio::select! {
                status = child.wait() => {
                    break status.map_err(|e| spawn_failed(format!("failed to wait for child: {e}")))?.into();
                }
                Some(()) = self.sigint.recv() => {
                    let signals = relay.on_interrupt();
                    forward(&child, &signals);
                }
                Some(()) = self.sigterm.recv() => {
                    let signals = relay.on_terminate();
                    forward(&child, &signals);
                }
            }
        };

        #[cfg(windows)]
        let outcome = loop {
            tokio::select! {
                status = child.wait() => {
                    break status.map_err(|e| spawn_failed(format!("failed to wait for child: {e}")))?.into();
                }
                Some(()) = self.ctrl_c.recv() => {
                    let signals = relay.on_interrupt();
                    forward(&mut child, &signals);
                }
            }
        };

        relay.on_child_exit();
        debug!("Child exited with {:?} (relay state {:?})", outcome, relay.state());
        Ok(outcome)
    }
}

#[cfg(unix)]
fn forward(child: &Child, signals: &[ChildSignal]) {
    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    for signal in signals {
        debug!("Forwarding {:?} to pid {}", signal, pid);
        // SAFETY: kill(2) has no memory-safety preconditions.
        let rc = unsafe { libc::kill(pid, signal.as_raw()) };
        if rc != 0 {
            debug!("kill({}, {:?}) failed: {}", pid, signal, std::io::Error::last_os_error());
        }
    }
}

#[cfg(windows)]
fn forward(child: &mut Child, signals: &[ChildSignal]) {
    // The console already delivers Ctrl-C to the child; only termination needs an explicit kill.
    if signals.contains(&ChildSignal::Terminate)
        && let Err(e) = child.start_kill()
    {
        debug!("Failed to terminate child: {}", e);
    }
}

/// Ends the current process the way the child ended.
///
/// A normal exit becomes `exit(code)`. A signal death restores the default
/// disposition of that signal and raises it on this process, so the parent
/// shell sees the same cause of death. `exit(128 + signal)` is the fallback if
/// the raised signal does not terminate the process.
pub fn exit_like(outcome: ExitOutcome) -> ! {
    match outcome {
        ExitOutcome::Code(code) => std::process::exit(code),
        ExitOutcome::Signal(signal) => {
            #[cfg(unix)]
            {
                // SAFETY: resetting a disposition to SIG_DFL and raising a signal have no memory-safety preconditions.
                unsafe {
                    libc::signal(signal, libc::SIG_DFL);
                    libc::raise(signal);
                }
            }
            std::process::exit(128 + signal)
        }
    }
}
