//! Network status pages.
//!
//! Alternates between a wired page and a wireless page on the top three
//! rows. Each page is queried first and then drawn under a single guard
//! acquisition, so the clear and the rows that follow it land together.

use crate::display::{CharDisplay, DisplayError, DisplayGuard, CMD_CLEAR};
use crate::net::{self, NetworkProbe, WifiStatus};

/// Longest SSID that fits on row 3
pub const SSID_MAX_CHARS: usize = 19;

/// Two-line message shown when no SSID is available
pub const SSID_ERROR_LINES: [&str; 2] = ["SSID scan error: not", "found or bad passwd"];

/// One page of network status, freshly built for every poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusPage {
    Eth { address: String },
    Wifi { address: String, ssid: Option<String> },
}

impl StatusPage {
    /// Build the wireless page from a status query result.
    ///
    /// A failed query or malformed output is shown the same way as a
    /// status without an `ssid` entry.
    pub fn wifi(address: String, status: Result<WifiStatus, net::NetworkError>) -> Self {
        let ssid = match status {
            Ok(mut status) => status.remove("ssid"),
            Err(e) => {
                tracing::warn!("Wifi status unavailable: {}", e);
                None
            }
        };
        StatusPage::Wifi { address, ssid }
    }

    /// Row number and text for every line of the page
    pub fn rows(&self) -> Vec<(u8, String)> {
        match self {
            StatusPage::Eth { address } => vec![(1, format!("eth: {address}"))],
            StatusPage::Wifi { address, ssid } => {
                let mut rows = vec![(1, format!("wifi:{address}"))];
                match ssid {
                    Some(ssid) => {
                        rows.push((2, "SSID:".to_string()));
                        rows.push((3, ssid.chars().take(SSID_MAX_CHARS).collect()));
                    }
                    None => {
                        rows.push((2, SSID_ERROR_LINES[0].to_string()));
                        rows.push((3, SSID_ERROR_LINES[1].to_string()));
                    }
                }
                rows
            }
        }
    }
}

/// Interface names polled by the updater
#[derive(Debug, Clone)]
pub struct Interfaces {
    pub eth: String,
    pub wlan: String,
}

impl Default for Interfaces {
    fn default() -> Self {
        Self {
            eth: "eth0".to_string(),
            wlan: "wlan0".to_string(),
        }
    }
}

/// Foreground network status updater
pub struct NetworkStatusUpdater<D, P> {
    guard: DisplayGuard<D>,
    probe: P,
    ifaces: Interfaces,
}

impl<D: CharDisplay, P: NetworkProbe> NetworkStatusUpdater<D, P> {
    pub fn new(guard: DisplayGuard<D>, probe: P, ifaces: Interfaces) -> Self {
        Self {
            guard,
            probe,
            ifaces,
        }
    }

    /// Show the wired interface address
    pub async fn show_eth(&self) -> Result<(), DisplayError> {
        let address = net::address_text(&self.probe, &self.ifaces.eth).await;
        self.draw(&StatusPage::Eth { address }).await
    }

    /// Show the wireless address and SSID
    pub async fn show_wifi(&self) -> Result<(), DisplayError> {
        let status = net::fetch_wifi_status(&self.probe, &self.ifaces.wlan).await;
        let address = net::address_text(&self.probe, &self.ifaces.wlan).await;
        self.draw(&StatusPage::wifi(address, status)).await
    }

    /// Clear the panel and write the page's rows under one guard acquisition
    async fn draw(&self, page: &StatusPage) -> Result<(), DisplayError> {
        tracing::debug!("Drawing {:?}", page);
        let rows = page.rows();
        self.guard
            .with_display(|lcd| -> Result<(), DisplayError> {
                lcd.write_command(CMD_CLEAR)?;
                for (row, text) in &rows {
                    lcd.write_line(text, *row)?;
                }
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayOp, FakeDisplay};
    use crate::net::{FakeProbe, NetworkError};

    type TestUpdater = NetworkStatusUpdater<FakeDisplay, FakeProbe>;

    fn updater(probe: FakeProbe) -> (DisplayGuard<FakeDisplay>, TestUpdater) {
        let guard = DisplayGuard::new(FakeDisplay::new());
        let updater = NetworkStatusUpdater::new(guard.clone(), probe, Interfaces::default());
        (guard, updater)
    }

    #[test]
    fn long_ssid_truncated_to_19() {
        let page = StatusPage::Wifi {
            address: "10.0.0.3".into(),
            ssid: Some("ThisNetworkNameIsWayTooLong".into()),
        };
        let rows = page.rows();
        assert_eq!(rows[2].1, "ThisNetworkNameIsWa");
        assert_eq!(rows[2].1.chars().count(), SSID_MAX_CHARS);
    }

    #[test]
    fn missing_ssid_shows_scan_error() {
        let mut status = WifiStatus::new();
        status.insert("wpa_state".into(), "SCANNING".into());
        let page = StatusPage::wifi("down".into(), Ok(status));
        assert_eq!(
            page.rows(),
            vec![
                (1, "wifi:down".to_string()),
                (2, "SSID scan error: not".to_string()),
                (3, "found or bad passwd".to_string()),
            ]
        );
    }

    #[test]
    fn parse_failure_treated_as_missing_ssid() {
        let page = StatusPage::wifi(
            "10.0.0.3".into(),
            Err(NetworkError::StatusParse("garbage".into())),
        );
        assert_eq!(
            page,
            StatusPage::Wifi {
                address: "10.0.0.3".into(),
                ssid: None
            }
        );
    }

    #[tokio::test]
    async fn show_eth_clears_then_writes_row_one() {
        let probe = FakeProbe::new().with_address("eth0", Ok("192.168.0.7".into()));
        let (guard, updater) = updater(probe);

        updater.show_eth().await.unwrap();

        let ops = guard.with_display(|d| d.take_ops()).await;
        assert_eq!(
            ops,
            vec![
                DisplayOp::Command(CMD_CLEAR),
                DisplayOp::line(1, "eth: 192.168.0.7"),
            ]
        );
    }

    #[tokio::test]
    async fn show_wifi_with_ssid() {
        let probe = FakeProbe::new()
            .with_address("wlan0", Ok("192.168.0.8".into()))
            .with_wifi_status(Ok("bssid=aa:bb\nssid=MyNet\nkey_mgmt=WPA2-PSK\n".into()));
        let (guard, updater) = updater(probe);

        updater.show_wifi().await.unwrap();

        let ops = guard.with_display(|d| d.take_ops()).await;
        assert_eq!(
            ops,
            vec![
                DisplayOp::Command(CMD_CLEAR),
                DisplayOp::line(1, "wifi:192.168.0.8"),
                DisplayOp::line(2, "SSID:"),
                DisplayOp::line(3, "MyNet"),
            ]
        );
    }

    #[tokio::test]
    async fn malformed_status_falls_back_to_scan_error() {
        let probe = FakeProbe::new()
            .with_address("wlan0", Err(NetworkError::AddressUnavailable("wlan0".into())))
            .with_wifi_status(Ok("Selected interface 'wlan0'\nssid=MyNet\n".into()));
        let (guard, updater) = updater(probe);

        updater.show_wifi().await.unwrap();

        let ops = guard.with_display(|d| d.take_ops()).await;
        assert_eq!(ops[1], DisplayOp::line(1, "wifi:down"));
        assert_eq!(ops[2], DisplayOp::line(2, SSID_ERROR_LINES[0]));
        assert_eq!(ops[3], DisplayOp::line(3, SSID_ERROR_LINES[1]));
    }
}
