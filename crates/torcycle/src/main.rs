// # torcycle - Tor Exit Address Rotator
//
// Thin integration layer: reads configuration from the environment, builds
// the service manager, the probe and the terminal, then hands control to
// `torcycle_core::Session`. No rotation logic lives here.
//
// ## Configuration
//
// All configuration is optional and done via environment variables:
//
// - `TORCYCLE_SERVICE_NAME`: service unit to control (default `tor`)
// - `TORCYCLE_PROXY_URL`: SOCKS endpoint (default `socks5h://127.0.0.1:9050`)
// - `TORCYCLE_LOOKUP_URL`: address-echo URL (default `https://checkip.amazonaws.com`)
// - `TORCYCLE_PROBE_TIMEOUT_SECS`: lookup timeout, 1..=120 (default 10)
// - `TORCYCLE_SUDO`: prefix lifecycle commands with sudo, `1`/`0` (default `1`)
// - `TORCYCLE_LOG_LEVEL`: trace, debug, info, warn, error (default `warn`)
//
// Logs go to stderr; stdout belongs to the operator dialogue.
//
// ## Example
//
// ```bash
// export TORCYCLE_SERVICE_NAME=tor@default
// export TORCYCLE_LOOKUP_URL=https://icanhazip.com
// torcycle
// ```

mod terminal;

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;
use torcycle_core::config::{DEFAULT_LOOKUP_URL, DEFAULT_PROXY_URL, DEFAULT_SERVICE_NAME};
use torcycle_core::{
    Lifecycle, Rotator, RotatorConfig, RotatorEvent, Session, SessionEnd, TerminationReason,
};
use torcycle_probe_http::SocksAddressProbe;
use torcycle_service::SystemServiceManager;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

use crate::terminal::TerminalConsole;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Upper bound on runtime shutdown; a pending stdin read never finishes
const RUNTIME_SHUTDOWN: Duration = Duration::from_millis(250);

/// Exit codes for different termination scenarios
///
/// - 0: The session ended (completed, invalid input, signal, or fault)
/// - 1: Configuration or startup error
/// - 2: Runtime error (the async runtime could not be built)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TorcycleExitCode {
    SessionEnded = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<TorcycleExitCode> for ExitCode {
    fn from(code: TorcycleExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug, Clone)]
struct Config {
    service_name: String,
    proxy_url: String,
    lookup_url: String,
    probe_timeout_secs: u64,
    use_sudo: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let probe_timeout_secs = match var("TORCYCLE_PROBE_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().with_context(|| {
                format!("TORCYCLE_PROBE_TIMEOUT_SECS must be a whole number of seconds. Got: {}", raw)
            })?,
            None => 10,
        };

        let use_sudo = match var("TORCYCLE_SUDO") {
            Some(raw) => parse_flag(&raw).with_context(|| {
                format!("TORCYCLE_SUDO must be one of 1, 0, true, false. Got: {}", raw)
            })?,
            None => true,
        };

        Ok(Self {
            service_name: var("TORCYCLE_SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            proxy_url: var("TORCYCLE_PROXY_URL").unwrap_or_else(|| DEFAULT_PROXY_URL.to_string()),
            lookup_url: var("TORCYCLE_LOOKUP_URL")
                .unwrap_or_else(|| DEFAULT_LOOKUP_URL.to_string()),
            probe_timeout_secs,
            use_sudo,
            log_level: var("TORCYCLE_LOG_LEVEL").unwrap_or_else(|| "warn".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !(1..=120).contains(&self.probe_timeout_secs) {
            anyhow::bail!(
                "TORCYCLE_PROBE_TIMEOUT_SECS must be between 1 and 120 seconds. Got: {}",
                self.probe_timeout_secs
            );
        }

        if self.log_level().is_none() {
            anyhow::bail!(
                "TORCYCLE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        self.rotator_config().validate().map_err(|e| {
            anyhow::anyhow!(
                "{}. Check TORCYCLE_SERVICE_NAME, TORCYCLE_PROXY_URL and TORCYCLE_LOOKUP_URL",
                e
            )
        })?;

        Ok(())
    }

    fn log_level(&self) -> Option<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }

    fn rotator_config(&self) -> RotatorConfig {
        RotatorConfig {
            service_name: self.service_name.clone(),
            use_sudo: self.use_sudo,
            proxy_url: self.proxy_url.clone(),
            lookup_url: self.lookup_url.clone(),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            ..RotatorConfig::default()
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return TorcycleExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return TorcycleExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level().unwrap_or(Level::WARN))
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return TorcycleExitCode::ConfigError.into();
    }

    info!("Starting torcycle for service '{}'", config.service_name);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return TorcycleExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match run(config).await {
            Ok(end) => {
                info!("Session ended: {:?}", end);
                TorcycleExitCode::SessionEnded
            }
            Err(e) => {
                error!("Startup error: {:#}", e);
                eprintln!("Startup error: {:#}", e);
                TorcycleExitCode::ConfigError
            }
        }
    });

    rt.shutdown_timeout(RUNTIME_SHUTDOWN);
    code.into()
}

/// Wire the components together and run one session
async fn run(config: Config) -> Result<SessionEnd> {
    let rotator_config = config.rotator_config();
    let lifecycle = Lifecycle::new();

    spawn_signal_bridge(lifecycle.clone())?;

    let service = SystemServiceManager::detect(config.service_name.clone(), config.use_sudo);
    let probe = SocksAddressProbe::from_config(&rotator_config)?;
    let console = TerminalConsole::new();

    let (rotator, events) = Rotator::new(
        Box::new(service),
        Box::new(probe),
        Box::new(console),
        rotator_config,
    )?;
    tokio::spawn(log_events(events));

    let session = Session::new(rotator, lifecycle);
    Ok(session.run().await)
}

async fn log_events(mut events: mpsc::Receiver<RotatorEvent>) {
    while let Some(event) = events.recv().await {
        debug!("Rotator event: {:?}", event);
    }
}

/// Forward SIGTERM and SIGINT to the lifecycle
///
/// Listeners are registered before this returns so no signal is missed
/// once the session starts.
#[cfg(unix)]
fn spawn_signal_bridge(lifecycle: Lifecycle) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    tokio::spawn(async move {
        loop {
            let reason = tokio::select! {
                Some(()) = sigterm.recv() => TerminationReason::Terminate,
                Some(()) = sigint.recv() => TerminationReason::Interrupt,
                else => break,
            };
            lifecycle.terminate(reason);
        }
    });

    Ok(())
}

/// Forward Ctrl+C to the lifecycle
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn spawn_signal_bridge(lifecycle: Lifecycle) -> Result<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            lifecycle.terminate(TerminationReason::Interrupt);
        }
    });

    Ok(())
}
