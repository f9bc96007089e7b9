// # Service Control
//
// This crate controls the Tor daemon through the host's service manager.
//
// ## Mechanisms
//
// - **systemctl** (primary): lifecycle actions plus a quiet `is-active`
//   status check
// - **service** (fallback): lifecycle actions only; there is no status
//   check, so `query_state()` reports `DaemonState::Unknown`
//
// The mechanism is chosen once, when the manager is built, by looking for
// `systemctl` on `PATH`.
//
// ## Privileges
//
// Lifecycle commands are prefixed with `sudo` unless disabled. The command
// inherits the terminal so `sudo` can prompt for a password. The status check
// never uses `sudo` and runs silenced.

use async_trait::async_trait;
use std::ffi::OsStr;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;
use torcycle_core::traits::{
    CommandStatus, ControlBackend, DaemonState, ServiceAction, ServiceManager,
};
use torcycle_core::{Error, Result};
use tracing::debug;

const SYSTEMCTL: &str = "systemctl";
const SERVICE: &str = "service";
const SUDO: &str = "sudo";

/// A fully resolved command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    /// Discard the command's output
    pub quiet: bool,
}

impl CommandLine {
    /// Build the command for `action` against `service_name`
    ///
    /// | backend   | action | command                                   |
    /// |-----------|--------|-------------------------------------------|
    /// | systemctl | status | `systemctl is-active --quiet <name>`      |
    /// | systemctl | other  | `[sudo] systemctl <action> <name>`        |
    /// | service   | any    | `[sudo] service <name> <action>`          |
    pub fn build(
        backend: ControlBackend,
        action: ServiceAction,
        service_name: &str,
        use_sudo: bool,
    ) -> Self {
        let mut words: Vec<&str> = Vec::with_capacity(5);

        match (backend, action) {
            (ControlBackend::Systemctl, ServiceAction::Status) => {
                words.extend([SYSTEMCTL, "is-active", "--quiet", service_name]);
            }
            (ControlBackend::Systemctl, action) => {
                if use_sudo {
                    words.push(SUDO);
                }
                words.extend([SYSTEMCTL, action.as_str(), service_name]);
            }
            (ControlBackend::Service, action) => {
                if use_sudo {
                    words.push(SUDO);
                }
                words.extend([SERVICE, service_name, action.as_str()]);
            }
        }

        let quiet = matches!(
            (backend, action),
            (ControlBackend::Systemctl, ServiceAction::Status)
        );
        let mut words = words.into_iter().map(str::to_string);
        Self {
            program: words.next().unwrap_or_default(),
            args: words.collect(),
            quiet,
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Pick the mechanism available on this host
pub fn detect_backend() -> ControlBackend {
    backend_for(which::which(SYSTEMCTL).is_ok())
}

/// Pick the mechanism given an explicit search path
pub fn detect_backend_in(search_path: &OsStr) -> ControlBackend {
    let cwd = std::env::current_dir().unwrap_or_default();
    backend_for(which::which_in(SYSTEMCTL, Some(search_path), cwd).is_ok())
}

fn backend_for(systemctl_found: bool) -> ControlBackend {
    if systemctl_found {
        ControlBackend::Systemctl
    } else {
        ControlBackend::Service
    }
}

/// ServiceManager backed by systemctl or service
pub struct SystemServiceManager {
    service_name: String,
    backend: ControlBackend,
    use_sudo: bool,
}

impl SystemServiceManager {
    /// Create a manager using whichever mechanism this host has
    pub fn detect(service_name: impl Into<String>, use_sudo: bool) -> Self {
        let backend = detect_backend();
        debug!("Service control backend: {:?}", backend);
        Self::with_backend(service_name, backend, use_sudo)
    }

    /// Create a manager for an explicit mechanism
    pub fn with_backend(
        service_name: impl Into<String>,
        backend: ControlBackend,
        use_sudo: bool,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            backend,
            use_sudo,
        }
    }

    pub fn command_line(&self, action: ServiceAction) -> CommandLine {
        CommandLine::build(self.backend, action, &self.service_name, self.use_sudo)
    }
}

/// Run `line` to completion and report its exit status
async fn execute(line: &CommandLine) -> Result<CommandStatus> {
    debug!("Running: {}", line);

    let mut command = Command::new(&line.program);
    command.args(&line.args).stdin(Stdio::inherit());

    if line.quiet {
        command.stdout(Stdio::null()).stderr(Stdio::null());
    }

    let status = command
        .status()
        .await
        .map_err(|e| Error::service_control(format!("Failed to run `{}`: {}", line, e)))?;

    Ok(CommandStatus { code: status.code() })
}

#[async_trait]
impl ServiceManager for SystemServiceManager {
    async fn manage(&self, action: ServiceAction) -> Result<CommandStatus> {
        execute(&self.command_line(action)).await
    }

    async fn query_state(&self) -> Result<DaemonState> {
        if !self.backend.supports_status() {
            return Ok(DaemonState::Unknown);
        }

        let status = self.manage(ServiceAction::Status).await?;
        Ok(if status.success() {
            DaemonState::Active
        } else {
            DaemonState::Inactive
        })
    }

    fn backend(&self) -> ControlBackend {
        self.backend
    }
}
