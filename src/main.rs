//! LCD Status Display for Raspberry Pi
//!
//! A small service that:
//! - Shows a continuously updating clock on a 20x4 character LCD
//! - Alternates wired and wireless network status above it
//! - Blanks the panel on SIGINT/SIGTERM

use anyhow::Context;
use clap::Parser;
use rpizerow_lcd_status::config::{self, Config};
use rpizerow_lcd_status::display::{CharDisplay, Lcd2004};
use rpizerow_lcd_status::net::SystemProbe;
use rpizerow_lcd_status::supervisor::Supervisor;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "lcd-status")]
#[command(about = "Clock and network status on a 20x4 I2C LCD")]
#[command(version)]
struct Args {
    /// Clock refresh interval in milliseconds
    #[arg(long, default_value_t = 100)]
    clock_interval_ms: u64,

    /// Seconds each network page is shown
    #[arg(long, default_value_t = 5)]
    phase_secs: u64,

    /// I2C bus number
    #[arg(long, default_value_t = 1)]
    i2c_bus: u8,

    /// I2C address of the LCD backpack (decimal or 0x-prefixed hex)
    #[arg(long, default_value = "0x27", value_parser = config::parse_i2c_addr)]
    i2c_addr: u16,

    /// Wired interface
    #[arg(long, default_value = "eth0")]
    eth: String,

    /// Wireless interface
    #[arg(long, default_value = "wlan0")]
    wlan: String,

    /// Path to wpa_cli
    #[arg(long, default_value = "/sbin/wpa_cli")]
    wpa_cli: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Clear display and exit
    #[arg(long)]
    clear: bool,
}

impl Args {
    fn to_config(&self) -> Config {
        Config {
            clock_interval_ms: self.clock_interval_ms,
            phase_secs: self.phase_secs,
            i2c_bus: self.i2c_bus,
            i2c_addr: self.i2c_addr,
            eth_iface: self.eth.clone(),
            wlan_iface: self.wlan.clone(),
            wpa_cli: self.wpa_cli.clone(),
        }
    }
}

/// Using current_thread runtime for single-core Pi Zero W
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    tracing::info!("Starting LCD Status Display");

    let config = args.to_config();
    config.validate()?;

    // Fatal if the panel cannot be reached
    let mut lcd = Lcd2004::new(config.i2c_bus, config.i2c_addr).with_context(|| {
        format!(
            "opening LCD on I2C bus {} at {:#04x}",
            config.i2c_bus, config.i2c_addr
        )
    })?;

    if args.clear {
        tracing::info!("Clearing display...");
        lcd.clear()?;
        tracing::info!("Display cleared");
        return Ok(());
    }

    let shutdown = shutdown_signal().context("installing signal handlers")?;

    let probe = SystemProbe::new(config.wpa_cli.clone());
    let mut supervisor = Supervisor::new(lcd, probe, &config)?;

    supervisor
        .run(shutdown)
        .await
        .context("display write failed")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
///
/// Default level is "warn" to minimize SD card wear from log writes.
/// Use --verbose flag for "debug" level during development/troubleshooting.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("rpizerow_lcd_status={},lcd_status={}", level, level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Install SIGTERM/SIGINT handlers and return a future that resolves on either
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT");
            }
        }
    })
}
