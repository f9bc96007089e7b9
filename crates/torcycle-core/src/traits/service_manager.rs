// # Service Manager Trait
//
// Defines the interface for controlling the Tor daemon's lifecycle.
//
// ## Implementations
//
// - systemctl with a `service` fallback: `torcycle-service` crate
//
// ## Usage
//
// ```rust,ignore
// use torcycle_core::traits::{ServiceAction, ServiceManager};
//
// let status = manager.manage(ServiceAction::Reload).await?;
// if !status.success() {
//     let _ = manager.manage(ServiceAction::Restart).await;
// }
// ```

use async_trait::async_trait;
use std::fmt;

/// Lifecycle action against the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceAction {
    Start,
    Stop,
    Reload,
    Restart,
    Status,
}

impl ServiceAction {
    /// Subcommand name understood by both systemctl and service
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Reload => "reload",
            ServiceAction::Restart => "restart",
            ServiceAction::Status => "status",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exit status of one lifecycle command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// Exit code, `None` if the command was killed by a signal
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Running state of the daemon, as of the moment it was queried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    Active,
    Inactive,
    /// No status mechanism available on this host
    Unknown,
}

/// Which service-control mechanism is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlBackend {
    /// systemd's `systemctl`
    Systemctl,
    /// SysV-style `service` wrapper
    Service,
}

impl ControlBackend {
    pub fn supports_status(&self) -> bool {
        matches!(self, ControlBackend::Systemctl)
    }
}

/// Trait for daemon lifecycle control
///
/// Implementations execute exactly one external command per call and never
/// retry. The reload→restart fallback belongs to the rotation cycle; stop
/// failures are ignored by the session.
///
/// Nothing is cached: every `query_state()` is a fresh query.
#[async_trait]
pub trait ServiceManager: Send + Sync {
    /// Run one lifecycle action
    ///
    /// # Returns
    ///
    /// - `Ok(CommandStatus)`: the command ran; non-zero means it failed
    /// - `Err(Error)`: the command could not be started at all
    async fn manage(&self, action: ServiceAction) -> Result<CommandStatus, crate::Error>;

    /// Query whether the daemon is active
    ///
    /// Backends without a status mechanism return `DaemonState::Unknown`.
    async fn query_state(&self) -> Result<DaemonState, crate::Error>;

    /// The mechanism behind this manager
    fn backend(&self) -> ControlBackend;
}
