use super::{NetworkError, NetworkProbe};
use std::collections::HashMap;

/// Scripted network probe used in tests.
///
/// Interfaces that were never configured report a query error, the same
/// way a missing interface does on a real system.
#[derive(Debug, Clone)]
pub struct FakeProbe {
    addresses: HashMap<String, Result<String, NetworkError>>,
    wifi_status: Result<String, NetworkError>,
}

impl Default for FakeProbe {
    fn default() -> Self {
        Self {
            addresses: HashMap::new(),
            wifi_status: Err(NetworkError::Query("wifi status not scripted".into())),
        }
    }
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, iface: &str, result: Result<String, NetworkError>) -> Self {
        self.addresses.insert(iface.to_string(), result);
        self
    }

    pub fn with_wifi_status(mut self, result: Result<String, NetworkError>) -> Self {
        self.wifi_status = result;
        self
    }
}

impl NetworkProbe for FakeProbe {
    async fn interface_address(&self, iface: &str) -> Result<String, NetworkError> {
        self.addresses
            .get(iface)
            .cloned()
            .unwrap_or_else(|| Err(NetworkError::Query(format!("no such interface: {iface}"))))
    }

    async fn wifi_status(&self, _iface: &str) -> Result<String, NetworkError> {
        self.wifi_status.clone()
    }
}
