//! Interactive session
//!
//! Owns the whole run from banner to the final `stop`:
//!
//! 1. Clear the display, print banner and welcome
//! 2. Ensure the daemon is running
//! 3. Ask for interval and count
//! 4. Run the rotation loop
//! 5. Stop the daemon, exactly once, whichever way the session ends
//!
//! Termination signals unwind every suspension point with
//! [`Error::Interrupted`]; the signal cleanup (notice, stop, grace pause)
//! happens here and nowhere else.

use crate::config::{BANNER, SessionParams};
use crate::engine::Rotator;
use crate::error::{Error, Result};
use crate::lifecycle::{Lifecycle, TerminationReason};
use tracing::{debug, error, info, warn};

/// How a session ended
///
/// Every variant is a normal end of the process; the daemon has been
/// asked to stop in all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// All bounded rotations ran
    Completed { rotations: u64 },
    /// An answer was not a non-negative integer; no rotation ran
    InvalidInput,
    /// A termination signal arrived
    Interrupted(TerminationReason),
    /// An unexpected fault ended the session
    Failed(String),
}

/// One interactive run
pub struct Session {
    rotator: Rotator,
    lifecycle: Lifecycle,
}

impl Session {
    pub fn new(rotator: Rotator, lifecycle: Lifecycle) -> Self {
        Self { rotator, lifecycle }
    }

    /// Run the session to its end
    pub async fn run(&self) -> SessionEnd {
        let params = match self.start().await {
            Ok(Some(params)) => params,
            Ok(None) => return SessionEnd::InvalidInput,
            Err(e) if e.is_interrupted() => return self.terminate().await,
            Err(e) => return self.fail(e).await,
        };

        info!(
            "Starting rotations: interval={}s count={}",
            params.interval, params.count
        );

        match self.rotator.run_rotations(params, &self.lifecycle).await {
            Ok(rotations) => {
                self.close().await;
                SessionEnd::Completed { rotations }
            }
            Err(e) if e.is_interrupted() => self.terminate().await,
            Err(e) => self.fail(e).await,
        }
    }

    /// Banner, ensure-running and prompts
    ///
    /// Returns `Ok(None)` when the operator's input was rejected; the daemon
    /// has already been stopped in that case.
    async fn start(&self) -> Result<Option<SessionParams>> {
        let console = self.rotator.console();
        let messages = self.rotator.messages();

        console.clear()?;
        console.say(BANNER)?;
        console.say(messages.welcome)?;

        self.rotator.ensure_running(&self.lifecycle).await?;

        match self.read_params().await {
            Ok(params) => Ok(Some(params)),
            Err(Error::InvalidInput(reason)) => {
                debug!("Rejected session parameters: {}", reason);
                if let Err(e) = console.say(messages.invalid_number) {
                    warn!("Failed to report invalid input: {}", e);
                }
                self.rotator.stop_daemon().await;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Ask for interval, then count
    ///
    /// An invalid interval ends the dialogue before the count prompt.
    async fn read_params(&self) -> Result<SessionParams> {
        let messages = self.rotator.messages();

        let interval = SessionParams::parse_value(&self.ask(messages.interval_prompt).await?)?;
        let count = SessionParams::parse_value(&self.ask(messages.count_prompt).await?)?;

        Ok(SessionParams { interval, count })
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        let answer = tokio::select! {
            biased;
            _ = self.lifecycle.cancelled() => return Err(self.lifecycle.interrupted()),
            answer = self.rotator.console().ask(prompt) => answer?,
        };

        answer.ok_or_else(|| Error::invalid_input("end of input"))
    }

    /// Closing phase after a completed or failed loop
    async fn close(&self) {
        if let Err(e) = self.rotator.console().say(self.rotator.messages().finished) {
            warn!("Failed to print closing notice: {}", e);
        }
        self.rotator.stop_daemon().await;
    }

    async fn fail(&self, err: Error) -> SessionEnd {
        error!("Session failed: {}", err);
        if let Err(e) = self.rotator.console().say(&format!("[!] Error: {}", err)) {
            warn!("Failed to report error: {}", e);
        }
        self.close().await;
        SessionEnd::Failed(err.to_string())
    }

    /// Signal path: notice, stop, grace pause
    ///
    /// The grace pause is not cancellable; the lifecycle is already
    /// terminating.
    async fn terminate(&self) -> SessionEnd {
        let reason = self
            .lifecycle
            .reason()
            .unwrap_or(TerminationReason::Interrupt);
        info!("Terminating session ({})", reason);

        if let Err(e) = self.rotator.console().say(self.rotator.messages().caught_signal) {
            warn!("Failed to print signal notice: {}", e);
        }
        self.rotator.stop_daemon().await;
        tokio::time::sleep(self.rotator.config().stop_grace).await;

        SessionEnd::Interrupted(reason)
    }
}
