//! Network probe backed by the host system.
//!
//! - Interface existence: `/sys/class/net/<iface>`
//! - IPv4 address: `ip -4 -o addr show dev <iface>`
//! - Wireless status: `wpa_cli -i <iface> status`

use super::{NetworkError, NetworkProbe};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Default location of the wpa_supplicant control tool
pub const DEFAULT_WPA_CLI: &str = "/sbin/wpa_cli";

const SYS_CLASS_NET: &str = "/sys/class/net";

/// Probe that shells out to `ip` and `wpa_cli`
#[derive(Debug, Clone)]
pub struct SystemProbe {
    wpa_cli: PathBuf,
}

impl SystemProbe {
    pub fn new(wpa_cli: impl Into<PathBuf>) -> Self {
        Self {
            wpa_cli: wpa_cli.into(),
        }
    }

    /// Run a command and return its stdout, mapping every failure to a query error
    async fn run(program: &Path, args: &[&str]) -> Result<String, NetworkError> {
        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| NetworkError::Query(format!("failed to run {}: {}", program.display(), e)))?;

        if !output.status.success() {
            return Err(NetworkError::Query(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        String::from_utf8(output.stdout).map_err(|_| {
            NetworkError::Query(format!("{} produced non-UTF-8 output", program.display()))
        })
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new(DEFAULT_WPA_CLI)
    }
}

impl NetworkProbe for SystemProbe {
    async fn interface_address(&self, iface: &str) -> Result<String, NetworkError> {
        if !is_valid_iface_name(iface) {
            return Err(NetworkError::Query(format!("invalid interface name {iface:?}")));
        }

        let sys_path = Path::new(SYS_CLASS_NET).join(iface);
        if !tokio::fs::try_exists(&sys_path).await.unwrap_or(false) {
            return Err(NetworkError::Query(format!("no such interface: {iface}")));
        }

        let stdout = Self::run(Path::new("ip"), &["-4", "-o", "addr", "show", "dev", iface]).await?;
        address_from_output(iface, &stdout)
    }

    async fn wifi_status(&self, iface: &str) -> Result<String, NetworkError> {
        Self::run(&self.wpa_cli, &["-i", iface, "status"]).await
    }
}

/// Kernel interface names are at most 15 bytes and never contain `/`
fn is_valid_iface_name(iface: &str) -> bool {
    !iface.is_empty() && iface.len() <= 15 && iface != "." && iface != ".." && !iface.contains('/')
}

/// Classify the output of a successful `ip` run for an existing interface
fn address_from_output(iface: &str, stdout: &str) -> Result<String, NetworkError> {
    parse_ip_addr_output(stdout).ok_or_else(|| NetworkError::AddressUnavailable(iface.to_string()))
}

/// Extract the first address from `ip -o` output.
///
/// Lines look like
/// `2: eth0    inet 192.168.1.10/24 brd 192.168.1.255 scope global eth0 ...`
pub fn parse_ip_addr_output(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        tokens.find(|t| *t == "inet")?;
        let cidr = tokens.next()?;
        let addr = cidr.split('/').next().unwrap_or(cidr);
        (!addr.is_empty()).then(|| addr.to_string())
    })
}
