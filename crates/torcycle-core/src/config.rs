//! Configuration types for torcycle
//!
//! There is no configuration file. [`RotatorConfig::default`] carries the
//! built-in constants; the binary may override a few of them from the
//! environment and then calls [`RotatorConfig::validate`].

use crate::error::{Error, Result};
use std::time::Duration;

/// Banner printed after clearing the display
pub const BANNER: &str = r"

@@@  @@@   @@@@@@              @@@  @@@@@@@
@@@@ @@@  @@@@@@@@             @@@  @@@@@@@@
@@!@!@@@  @@!  @@@             @@!  @@!  @@@
!@!!@!@!  !@!  @!@             !@!  !@!  @!@
@!@ !!@!  @!@  !@!  @!@!@!@!@  !!@  @!@@!@!
!@!  !!!  !@!  !!!  !!!@!@!!!  !!!  !!@!!!
!!:  !!!  !!:  !!!             !!:  !!:
:!:  !:!  :!:  !:!             :!:  :!:
::   ::  ::::: ::              ::   ::
::    :    : :  :              :     :

";

/// Default Tor SOCKS endpoint; `socks5h` resolves hostnames at the proxy
pub const DEFAULT_PROXY_URL: &str = "socks5h://127.0.0.1:9050";

/// Default address-echo service
pub const DEFAULT_LOOKUP_URL: &str = "https://checkip.amazonaws.com";

/// Default systemd / SysV service name
pub const DEFAULT_SERVICE_NAME: &str = "tor";

/// Operator-facing message strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    pub welcome: &'static str,
    pub interval_prompt: &'static str,
    pub count_prompt: &'static str,
    pub invalid_number: &'static str,
    pub infinite_mode: &'static str,
    pub changing_ip: &'static str,
    pub ip_output: &'static str,
    pub error: &'static str,
    pub ensuring_running: &'static str,
    pub starting_inactive: &'static str,
    pub already_active: &'static str,
    pub starting_fallback: &'static str,
    pub status_unavailable: &'static str,
    pub caught_signal: &'static str,
    pub finished: &'static str,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            welcome: "=== Automatic Tor IP Changer ===",
            interval_prompt: "Enter time interval in seconds (e.g. 30): ",
            count_prompt: "Enter how many times to change IP (0 = infinite): ",
            invalid_number: "Invalid number entered.",
            infinite_mode: "Starting infinite mode. Press Ctrl+C to stop.",
            changing_ip: "[+] Reloading Tor service...",
            ip_output: "New IP address: ",
            error: "Failed to get IP: ",
            ensuring_running: "[*] Ensuring Tor service is running...",
            starting_inactive: "[*] Tor is not active, starting Tor (requires sudo)...",
            already_active: "[*] Tor appears to be active.",
            starting_fallback: "[*] systemctl not found, trying 'service tor start' (requires sudo)...",
            status_unavailable: "[*] Could not check Tor status, starting Tor (requires sudo)...",
            caught_signal: "\n[!] Caught exit signal, stopping Tor and exiting...",
            finished: "[*] Task finished or interrupted, stopping Tor (requires sudo)...",
        }
    }
}

/// Main torcycle configuration
#[derive(Debug, Clone)]
pub struct RotatorConfig {
    /// Name of the daemon's service unit
    pub service_name: String,

    /// Prefix lifecycle commands with `sudo`
    pub use_sudo: bool,

    /// Proxy for both HTTP and HTTPS lookups
    pub proxy_url: String,

    /// Address-echo URL
    pub lookup_url: String,

    /// Timeout for one lookup
    pub probe_timeout: Duration,

    /// Pause after reload/restart before probing
    pub settle_delay: Duration,

    /// Pause after the startup `start`
    pub startup_delay: Duration,

    /// Pause after the signal-path `stop`
    pub stop_grace: Duration,

    /// Half-width of the random window around the interval in unbounded mode
    pub jitter: Duration,

    /// Lower bound of the unbounded-mode delay
    pub min_unbounded_delay: Duration,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    pub event_channel_capacity: usize,

    /// Operator strings
    pub messages: Messages,
}

impl RotatorConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            use_sudo: true,
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            probe_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_secs(5),
            startup_delay: Duration::from_secs(4),
            stop_grace: Duration::from_secs(1),
            jitter: Duration::from_secs(5),
            min_unbounded_delay: Duration::from_secs(5),
            event_channel_capacity: 64,
            messages: Messages::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.service_name.trim().is_empty() {
            return Err(Error::config("Service name cannot be empty"));
        }

        if self
            .service_name
            .chars()
            .any(|c| c.is_whitespace() || c == '/')
        {
            return Err(Error::config(format!(
                "Service name '{}' must not contain whitespace or '/'",
                self.service_name
            )));
        }

        if !self.proxy_url.starts_with("socks5h://") && !self.proxy_url.starts_with("socks5://") {
            return Err(Error::config(format!(
                "Proxy URL must use the socks5h:// or socks5:// scheme. Got: {}",
                self.proxy_url
            )));
        }

        if !self.lookup_url.starts_with("https://") && !self.lookup_url.starts_with("http://") {
            return Err(Error::config(format!(
                "Lookup URL must use HTTP or HTTPS scheme. Got: {}",
                self.lookup_url
            )));
        }

        if self.probe_timeout.is_zero() {
            return Err(Error::config("Probe timeout must be > 0"));
        }

        if self.event_channel_capacity == 0 {
            return Err(Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Operator-entered session parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionParams {
    /// Seconds between rotations
    pub interval: u64,
    /// Number of rotations, 0 = unbounded
    pub count: u64,
}

impl SessionParams {
    /// Parse one prompt answer as a non-negative integer
    pub fn parse_value(raw: &str) -> Result<u64> {
        let trimmed = raw.trim();
        trimmed.parse::<u64>().map_err(|_| {
            Error::invalid_input(format!("'{}' is not a non-negative integer", trimmed))
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.count == 0
    }
}
