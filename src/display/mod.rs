//! Display module for the character LCD.
//!
//! This module provides the interface to a 20x4 HD44780 character display
//! driven through a PCF8574 I2C backpack, and the guard that serializes
//! access to it between the clock and the network status updaters.

pub mod fake;
pub mod lcd2004;

// Re-export main types
pub use fake::{DisplayOp, FakeDisplay};
pub use lcd2004::Lcd2004;

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Number of character rows on the panel
pub const ROWS: u8 = 4;

/// Number of character columns on the panel
pub const COLUMNS: usize = 20;

/// Raw HD44780 "clear display" instruction
pub const CMD_CLEAR: u8 = 0x01;

/// Display driver errors
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("I2C error: {0}")]
    I2c(#[from] rppal::i2c::Error),

    #[error("Invalid row {0}: expected 1..=4")]
    InvalidRow(u8),

    #[error("Display task failed: {0}")]
    TaskFailed(String),
}

/// Operations the updaters need from a character display.
///
/// Implementations are not expected to be thread-safe; all access from
/// concurrent code goes through [`DisplayGuard`].
pub trait CharDisplay: Send {
    /// Blank the panel and return the cursor home
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Send a raw instruction byte
    fn write_command(&mut self, code: u8) -> Result<(), DisplayError>;

    /// Write `text` starting at column 0 of `row` (1-based)
    fn write_line(&mut self, text: &str, row: u8) -> Result<(), DisplayError>;
}

/// Thread-safe display wrapper
///
/// Cloning hands out another reference to the same device; the device
/// itself is never duplicated.
pub struct DisplayGuard<D> {
    device: Arc<Mutex<D>>,
}

impl<D: CharDisplay> DisplayGuard<D> {
    /// Take ownership of the device
    pub fn new(device: D) -> Self {
        Self {
            device: Arc::new(Mutex::new(device)),
        }
    }

    /// Run `action` with exclusive access to the device.
    ///
    /// The lock is released when the call returns, including when `action`
    /// returns an error or unwinds. `action` is synchronous, so the lock is
    /// never held across an await point.
    pub async fn with_display<T>(&self, action: impl FnOnce(&mut D) -> T) -> T {
        let mut device = self.device.lock().await;
        action(&mut device)
    }

    /// Send the raw clear instruction
    pub async fn clear_raw(&self) -> Result<(), DisplayError> {
        self.with_display(|lcd| lcd.write_command(CMD_CLEAR)).await
    }
}

impl<D> Clone for DisplayGuard<D> {
    fn clone(&self) -> Self {
        Self {
            device: Arc::clone(&self.device),
        }
    }
}
