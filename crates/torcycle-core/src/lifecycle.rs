//! Process lifecycle: RUNNING until the first termination signal, then
//! TERMINATING for good.
//!
//! The OS signal listeners live in the binary. They only call
//! [`Lifecycle::terminate`]; every suspension point in the session selects on
//! [`Lifecycle::cancelled`] and unwinds with [`crate::Error::Interrupted`], so
//! cleanup happens once, at the top of the session.

use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Why the process is terminating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Interrupt => f.write_str("SIGINT"),
            TerminationReason::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    Terminating,
}

/// Shared handle on the process lifecycle
///
/// Cloning is cheap; all clones observe the same transition.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    token: CancellationToken,
    reason: Arc<OnceLock<TerminationReason>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to TERMINATING
    ///
    /// Returns `true` only for the call that performed the transition. Later
    /// calls are no-ops and keep the first reason.
    pub fn terminate(&self, reason: TerminationReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        if first {
            info!("Termination requested by {}", reason);
        }
        self.token.cancel();
        first
    }

    pub fn state(&self) -> LifecycleState {
        if self.token.is_cancelled() {
            LifecycleState::Terminating
        } else {
            LifecycleState::Running
        }
    }

    pub fn is_terminating(&self) -> bool {
        self.state() == LifecycleState::Terminating
    }

    /// The reason recorded by the first `terminate` call
    pub fn reason(&self) -> Option<TerminationReason> {
        self.reason.get().copied()
    }

    /// Completes once the lifecycle is TERMINATING
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Error to unwind with from an interrupted suspension point
    pub(crate) fn interrupted(&self) -> crate::Error {
        crate::Error::Interrupted(self.reason().unwrap_or(TerminationReason::Interrupt))
    }
}
