// # Address Probe Trait
//
// Reads back the externally visible address as seen through the daemon.
//
// ## Implementations
//
// - reqwest over the local SOCKS proxy: `torcycle-probe-http` crate

use async_trait::async_trait;

/// Trait for exit address lookups
///
/// One call is one outbound request. Implementations do not retry and do not
/// distinguish transient from permanent failures; the caller turns any error
/// into display text.
#[async_trait]
pub trait AddressProbe: Send + Sync {
    /// Fetch the current exit address as text, whitespace-trimmed
    async fn fetch(&self) -> Result<String, crate::Error>;
}
