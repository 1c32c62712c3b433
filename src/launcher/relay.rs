//! Signal relay state machine.

use tracing::debug;

/// Signal to deliver to the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSignal {
    /// SIGINT
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl ChildSignal {
    /// Raw signal number.
    #[cfg(unix)]
    pub const fn as_raw(self) -> i32 {
        match self {
            Self::Interrupt => libc::SIGINT,
            Self::Terminate => libc::SIGTERM,
        }
    }
}

/// Where the relay is in the child's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Child running, nothing forwarded yet.
    Running,
    /// Parent got an interrupt; forwarding is in progress.
    InterruptReceived,
    /// Interrupt and terminate were forwarded.
    TerminateSent,
    /// Child is gone.
    Exited,
}

/// Decides which signals reach the child.
#[derive(Debug)]
pub struct SignalRelay {
    state: RelayState,
}

impl SignalRelay {
    /// A relay for a freshly spawned child.
    pub const fn new() -> Self {
        Self {
            state: RelayState::Running,
        }
    }

    /// Current state.
    pub const fn state(&self) -> RelayState {
        self.state
    }

    /// The parent received an interrupt. Returns the signals to forward, in order.
    pub fn on_interrupt(&mut self) -> Vec<ChildSignal> {
        let signals = match self.state {
            RelayState::Running | RelayState::InterruptReceived => {
                self.transition(RelayState::InterruptReceived);
                vec![ChildSignal::Interrupt, ChildSignal::Terminate]
            }
            // child ignored the first round; ask again
            RelayState::TerminateSent => vec![ChildSignal::Terminate],
            RelayState::Exited => Vec::new(),
        };
        if !signals.is_empty() {
            self.transition(RelayState::TerminateSent);
        }
        signals
    }

    /// The parent was asked to terminate. Returns the signals to forward.
    pub fn on_terminate(&mut self) -> Vec<ChildSignal> {
        if self.state == RelayState::Exited {
            return Vec::new();
        }
        self.transition(RelayState::TerminateSent);
        vec![ChildSignal::Terminate]
    }

    /// The child exited. Further parent signals forward nothing.
    pub fn on_child_exit(&mut self) {
        self.transition(RelayState::Exited);
    }

    fn transition(&mut self, next: RelayState) {
        if self.state != next {
            debug!("Signal relay: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

impl Default for SignalRelay {
    fn default() -> Self {
        Self::new()
    }
}
