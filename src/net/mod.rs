//! Network status queries.
//!
//! Looks up interface IPv4 addresses and the wireless link status, and
//! classifies failures so the display can show a placeholder instead.

pub mod fake;
pub mod system;

pub use fake::FakeProbe;
pub use system::SystemProbe;

use std::collections::HashMap;
use thiserror::Error;

/// Placeholder shown when an interface is up but has no address
pub const PLACEHOLDER_DOWN: &str = "down";

/// Placeholder shown for any other address lookup failure
pub const PLACEHOLDER_ERROR: &str = "error";

/// Network query errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Interface {0} has no IPv4 address")]
    AddressUnavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed status line: {0:?}")]
    StatusParse(String),
}

impl NetworkError {
    /// Text shown on the panel in place of an address
    pub fn placeholder(&self) -> &'static str {
        match self {
            NetworkError::AddressUnavailable(_) => PLACEHOLDER_DOWN,
            NetworkError::Query(_) | NetworkError::StatusParse(_) => PLACEHOLDER_ERROR,
        }
    }
}

/// Source of interface addresses and wireless status.
#[allow(async_fn_in_trait)]
pub trait NetworkProbe {
    /// First IPv4 address assigned to `iface`
    async fn interface_address(&self, iface: &str) -> Result<String, NetworkError>;

    /// Raw `key=value` status output for the wireless interface `iface`
    async fn wifi_status(&self, iface: &str) -> Result<String, NetworkError>;
}

/// Wireless status keyed by field name (`ssid`, `key_mgmt`, ...)
pub type WifiStatus = HashMap<String, String>;

/// Parse `key=value` lines, splitting each at the first `=`.
///
/// Later duplicates overwrite earlier ones. Any line without `=` fails the
/// whole parse.
pub fn parse_wifi_status(output: &str) -> Result<WifiStatus, NetworkError> {
    let mut status = WifiStatus::new();
    for line in output.lines() {
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| NetworkError::StatusParse(line.to_string()))?;
        status.insert(key.to_string(), value.to_string());
    }
    Ok(status)
}

/// Resolve an address, degrading failures to their placeholder
pub async fn address_text<P: NetworkProbe>(probe: &P, iface: &str) -> String {
    match probe.interface_address(iface).await {
        Ok(addr) => addr,
        Err(e) => {
            tracing::debug!("Address lookup for {} failed: {}", iface, e);
            e.placeholder().to_string()
        }
    }
}

/// Query and parse wireless status in one step
pub async fn fetch_wifi_status<P: NetworkProbe>(
    probe: &P,
    iface: &str,
) -> Result<WifiStatus, NetworkError> {
    let output = probe.wifi_status(iface).await?;
    parse_wifi_status(&output)
}
