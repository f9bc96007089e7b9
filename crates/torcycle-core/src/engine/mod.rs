//! Core rotation engine
//!
//! The Rotator is responsible for:
//! - Driving the daemon through reload (or restart) to get a new circuit
//! - Reading back the exit address through the daemon's proxy
//! - Pacing rotations according to the session's schedule
//! - Stopping the daemon when asked
//!
//! ## Architecture
//!
//! ```text
//!                     ┌──────────────┐
//!                     │   Rotator    │
//!                     └──────────────┘
//!                            │
//!      ┌─────────────────────┼─────────────────────┬─────────────────┐
//!      │                     │                     │                 │
//!      ▼                     ▼                     ▼                 ▼
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ServiceManager│   │ AddressProbe │   │   Console    │   │   Events    │
//! │(reload/stop) │   │ (exit addr)  │   │  (operator)  │   │  (observe)  │
//! └──────────────┘   └──────────────┘   └──────────────┘   └─────────────┘
//! ```
//!
//! ## Rotation Flow
//!
//! 1. Reload the daemon
//! 2. If reload fails, restart it once (result ignored)
//! 3. Settle pause
//! 4. Probe and print the address
//! 5. Wait the scheduled delay
//!
//! Every pause and every probe also waits on the [`Lifecycle`]; when it moves
//! to TERMINATING the engine returns [`crate::Error::Interrupted`] immediately.

pub mod schedule;

pub use schedule::RotationSchedule;

use crate::config::{Messages, RotatorConfig, SessionParams};
use crate::error::Result;
use crate::lifecycle::Lifecycle;
use crate::traits::{
    AddressProbe, CommandStatus, Console, DaemonState, Progress, ServiceAction, ServiceManager,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events emitted by the Rotator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotatorEvent {
    /// A lifecycle command finished (`status` is `None` if it could not run)
    ActionIssued {
        action: ServiceAction,
        status: Option<CommandStatus>,
    },

    /// A rotation cycle began
    RotationStarted,

    /// The address lookup finished
    AddressProbed {
        address: String,
        /// `true` when `address` is an error description
        degraded: bool,
    },

    /// Waiting before the next rotation
    DelayScheduled {
        delay: Duration,
    },

    /// All bounded rotations ran
    Completed {
        rotations: u64,
    },
}

/// Core rotation engine
///
/// ## Lifecycle
///
/// 1. Create with [`Rotator::new()`]
/// 2. [`Rotator::ensure_running()`] once
/// 3. [`Rotator::run_rotations()`] until the count is exhausted or the
///    lifecycle terminates
/// 4. [`Rotator::stop_daemon()`] on the way out
///
/// ## Threading
///
/// All operations run sequentially on the caller's task. The event channel is
/// bounded; when it is full, events are dropped with a warning.
pub struct Rotator {
    /// Daemon lifecycle control
    service: Box<dyn ServiceManager>,

    /// Exit address lookup
    probe: Box<dyn AddressProbe>,

    /// Operator terminal
    console: Box<dyn Console>,

    config: RotatorConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<RotatorEvent>,
}

impl Rotator {
    /// Create a new rotator
    ///
    /// # Returns
    ///
    /// A tuple of (rotator, event_receiver) where event_receiver yields rotator events
    pub fn new(
        service: Box<dyn ServiceManager>,
        probe: Box<dyn AddressProbe>,
        console: Box<dyn Console>,
        config: RotatorConfig,
    ) -> Result<(Self, mpsc::Receiver<RotatorEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let rotator = Self {
            service,
            probe,
            console,
            config,
            event_tx: tx,
        };

        Ok((rotator, rx))
    }

    pub fn config(&self) -> &RotatorConfig {
        &self.config
    }

    pub fn messages(&self) -> &Messages {
        &self.config.messages
    }

    pub fn console(&self) -> &dyn Console {
        self.console.as_ref()
    }

    /// Make sure the daemon is running before the first rotation
    ///
    /// With a status mechanism the daemon is started only when inactive.
    /// Without one (or if the status check cannot run) it is started
    /// unconditionally.
    pub async fn ensure_running(&self, lifecycle: &Lifecycle) -> Result<()> {
        let messages = self.messages();
        self.console.say(messages.ensuring_running)?;

        let backend = self.service.backend();
        let state = match self.service.query_state().await {
            Ok(state) => state,
            Err(e) => {
                warn!("Status check failed, assuming unknown: {}", e);
                DaemonState::Unknown
            }
        };
        debug!("Daemon state via {:?}: {:?}", backend, state);

        let notice = match state {
            DaemonState::Active => {
                self.console.say(messages.already_active)?;
                return Ok(());
            }
            DaemonState::Inactive => messages.starting_inactive,
            DaemonState::Unknown if backend.supports_status() => messages.status_unavailable,
            DaemonState::Unknown => messages.starting_fallback,
        };
        self.console.say(notice)?;

        if let Ok(status) = self.issue(ServiceAction::Start).await
            && !status.success()
        {
            warn!("Starting {} failed ({})", self.config.service_name, status);
        }

        // A terminal signal also reaches the start command
        if lifecycle.is_terminating() {
            return Err(lifecycle.interrupted());
        }

        self.pause(self.config.startup_delay, lifecycle).await
    }

    /// One rotation: reload, restart if the reload failed, settle
    ///
    /// Does not probe; the caller observes the result.
    pub async fn rotate(&self, lifecycle: &Lifecycle) -> Result<()> {
        self.console.say(self.messages().changing_ip)?;
        self.emit_event(RotatorEvent::RotationStarted);

        let reloaded = self
            .issue(ServiceAction::Reload)
            .await
            .is_ok_and(|status| status.success());

        // A terminal signal also kills the reload; that is not a failed reload
        if lifecycle.is_terminating() {
            return Err(lifecycle.interrupted());
        }

        if !reloaded {
            warn!("Reload of {} failed, restarting", self.config.service_name);
            let _ = self.issue(ServiceAction::Restart).await;
        }

        self.pause(self.config.settle_delay, lifecycle).await
    }

    /// Look up the exit address
    ///
    /// A failed lookup is returned as `"<error prefix> <cause>"` text, never
    /// as an error. The only error is [`crate::Error::Interrupted`].
    pub async fn probe_address(&self, lifecycle: &Lifecycle) -> Result<String> {
        let outcome = tokio::select! {
            biased;
            _ = lifecycle.cancelled() => return Err(lifecycle.interrupted()),
            outcome = self.probe.fetch() => outcome,
        };

        let (address, degraded) = match outcome {
            Ok(address) => (address, false),
            Err(e) => {
                warn!("Address probe failed: {}", e);
                (format!("{} {}", self.messages().error.trim_end(), e), true)
            }
        };

        self.emit_event(RotatorEvent::AddressProbed {
            address: address.clone(),
            degraded,
        });

        Ok(address)
    }

    /// Run the rotation loop for `params`
    ///
    /// Bounded runs rotate exactly `count` times, waiting `interval` after
    /// each. Unbounded runs (`count == 0`) never return `Ok`.
    ///
    /// # Returns
    ///
    /// - `Ok(rotations)`: all bounded rotations ran
    /// - `Err(Error::Interrupted)`: the lifecycle terminated
    /// - `Err(_)`: any other fault in the loop body
    pub async fn run_rotations(&self, params: SessionParams, lifecycle: &Lifecycle) -> Result<u64> {
        let schedule = RotationSchedule::new(params, &self.config);
        let messages = self.messages();

        if schedule.total().is_none() {
            self.console.say(messages.infinite_mode)?;
        }

        let mut completed: u64 = 0;
        while schedule.total().is_none_or(|total| completed < total) {
            if lifecycle.is_terminating() {
                return Err(lifecycle.interrupted());
            }

            self.rotate(lifecycle).await?;
            let address = self.probe_address(lifecycle).await?;
            completed += 1;

            let progress = schedule.total().map(|total| Progress {
                current: completed,
                total,
            });
            self.console
                .report_address(messages.ip_output, &address, progress)?;

            let delay = schedule.next_delay(&mut rand::thread_rng());
            debug!("Rotation {} done, next in {:?}", completed, delay);
            self.emit_event(RotatorEvent::DelayScheduled { delay });
            self.pause(delay, lifecycle).await?;
        }

        info!("Completed {} rotation(s)", completed);
        self.emit_event(RotatorEvent::Completed {
            rotations: completed,
        });

        Ok(completed)
    }

    /// Stop the daemon, best effort
    ///
    /// Failures are logged and otherwise ignored. Safe to call when the
    /// daemon is already stopped.
    pub async fn stop_daemon(&self) {
        match self.issue(ServiceAction::Stop).await {
            Ok(status) if !status.success() => {
                warn!("Stopping {} failed ({})", self.config.service_name, status);
            }
            Ok(_) => info!("Stopped {}", self.config.service_name),
            Err(e) => warn!("Stopping {} failed: {}", self.config.service_name, e),
        }
    }

    /// Sleep for `duration` unless the lifecycle terminates first
    pub async fn pause(&self, duration: Duration, lifecycle: &Lifecycle) -> Result<()> {
        tokio::select! {
            biased;
            _ = lifecycle.cancelled() => Err(lifecycle.interrupted()),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Run one lifecycle action and report it
    async fn issue(&self, action: ServiceAction) -> Result<CommandStatus> {
        let outcome = self.service.manage(action).await;

        match &outcome {
            Ok(status) => debug!("{} {}: {}", action, self.config.service_name, status),
            Err(e) => warn!("{} {} could not run: {}", action, self.config.service_name, e),
        }

        self.emit_event(RotatorEvent::ActionIssued {
            action,
            status: outcome.as_ref().ok().copied(),
        });

        outcome
    }

    /// Emit a rotator event
    fn emit_event(&self, event: RotatorEvent) {
        // A full channel means nobody keeps up with the events; drop rather than block
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full or closed, dropping event");
        }
    }
}

