// # SOCKS Address Probe
//
// This crate reads back the Tor exit address by fetching an address-echo
// service (e.g. checkip.amazonaws.com, icanhazip.com) through Tor's local
// SOCKS proxy.
//
// ## Routing
//
// Both `http://` and `https://` lookups go through the same proxy. With the
// `socks5h` scheme the hostname is resolved by Tor, not locally.
//
// ## IMPORTANT: Never Direct
//
// A client that cannot be built with the proxy is an error. Falling back to
// a direct client would report the host's own address as the exit address.

use async_trait::async_trait;
use std::time::Duration;
use torcycle_core::config::RotatorConfig;
use torcycle_core::traits::AddressProbe;
use torcycle_core::{Error, Result};

/// Address probe routed through a SOCKS proxy
pub struct SocksAddressProbe {
    /// URL to fetch the address from
    lookup_url: String,

    /// HTTP client with the proxy installed
    client: reqwest::Client,
}

impl SocksAddressProbe {
    /// Create a new probe
    ///
    /// # Parameters
    ///
    /// - `proxy_url`: SOCKS endpoint (e.g., "socks5h://127.0.0.1:9050")
    /// - `lookup_url`: address-echo URL (e.g., "https://checkip.amazonaws.com")
    /// - `timeout`: bound on the whole request
    pub fn new(proxy_url: &str, lookup_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| Error::config(format!("Invalid proxy URL '{}': {}", proxy_url, e)))?;

        let client = reqwest::Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            lookup_url: lookup_url.into(),
            client,
        })
    }

    /// Create from the rotator configuration
    pub fn from_config(config: &RotatorConfig) -> Result<Self> {
        Self::new(&config.proxy_url, config.lookup_url.clone(), config.probe_timeout)
    }
}

#[async_trait]
impl AddressProbe for SocksAddressProbe {
    async fn fetch(&self) -> Result<String> {
        tracing::debug!("Probing exit address via {}", self.lookup_url);

        let response = self
            .client
            .get(&self.lookup_url)
            .send()
            .await
            .map_err(|e| Error::probe(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::probe(format!("HTTP error: {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::probe(format!("Failed to read response: {}", e)))?;

        Ok(body.trim().to_string())
    }
}
