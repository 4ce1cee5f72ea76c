//! Runtime configuration for the LCD status display.
//!
//! Everything is fixed at startup from command-line flags; nothing is
//! loaded from or saved to disk.

use crate::display::lcd2004;
use crate::net::system::DEFAULT_WPA_CLI;
use crate::status::Interfaces;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Clock redraw interval in milliseconds
    pub clock_interval_ms: u64,

    /// Seconds each network page stays on screen
    pub phase_secs: u64,

    /// I2C bus number
    pub i2c_bus: u8,

    /// PCF8574 backpack address
    pub i2c_addr: u16,

    /// Wired interface name
    pub eth_iface: String,

    /// Wireless interface name
    pub wlan_iface: String,

    /// Path to wpa_cli
    pub wpa_cli: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clock_interval_ms: 100,
            phase_secs: 5,
            i2c_bus: lcd2004::config::DEFAULT_BUS,
            i2c_addr: lcd2004::config::DEFAULT_ADDRESS,
            eth_iface: "eth0".to_string(),
            wlan_iface: "wlan0".to_string(),
            wpa_cli: PathBuf::from(DEFAULT_WPA_CLI),
        }
    }
}

impl Config {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(10..=60_000).contains(&self.clock_interval_ms) {
            return Err(ConfigError::ValidationError(format!(
                "clock interval {}ms must be between 10 and 60000",
                self.clock_interval_ms
            )));
        }

        if !(1..=3600).contains(&self.phase_secs) {
            return Err(ConfigError::ValidationError(format!(
                "phase duration {}s must be between 1 and 3600",
                self.phase_secs
            )));
        }

        // 7-bit addresses outside the reserved ranges
        if !(0x08..=0x77).contains(&self.i2c_addr) {
            return Err(ConfigError::ValidationError(format!(
                "I2C address {:#04x} must be between 0x08 and 0x77",
                self.i2c_addr
            )));
        }

        if self.eth_iface.trim().is_empty() || self.wlan_iface.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "interface names cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn clock_interval(&self) -> Duration {
        Duration::from_millis(self.clock_interval_ms)
    }

    pub fn phase_duration(&self) -> Duration {
        Duration::from_secs(self.phase_secs)
    }

    pub fn interfaces(&self) -> Interfaces {
        Interfaces {
            eth: self.eth_iface.clone(),
            wlan: self.wlan_iface.clone(),
        }
    }
}

/// Parse an I2C address given as decimal or `0x`-prefixed hex
pub fn parse_i2c_addr(s: &str) -> Result<u16, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid I2C address '{}': {}", s, e))
}
