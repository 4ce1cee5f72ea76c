//! HD44780 20x4 character LCD behind a PCF8574 I2C backpack.
//!
//! The backpack maps the expander's 8 output bits to the controller's
//! control lines and upper data nibble, so every instruction or character
//! is sent as two 4-bit transfers, each latched with an enable strobe.
//!
//! Pin mapping (PCF8574 bit -> HD44780):
//! - P0: RS (register select)
//! - P1: RW (held low)
//! - P2: EN (enable)
//! - P3: backlight
//! - P4..P7: D4..D7

use super::{CharDisplay, DisplayError, CMD_CLEAR, COLUMNS, ROWS};
use rppal::i2c::I2c;
use std::thread;
use std::time::Duration;

/// I2C configuration
pub mod config {
    /// Raspberry Pi header I2C bus
    pub const DEFAULT_BUS: u8 = 1;
    /// Factory address of most PCF8574 backpacks
    pub const DEFAULT_ADDRESS: u16 = 0x27;
}

/// HD44780 instructions
mod cmd {
    pub const RETURN_HOME: u8 = 0x02;
    pub const ENTRY_MODE_SET: u8 = 0x04;
    pub const DISPLAY_CONTROL: u8 = 0x08;
    pub const FUNCTION_SET: u8 = 0x20;
    pub const SET_DDRAM_ADDR: u8 = 0x80;

    pub const ENTRY_LEFT: u8 = 0x02;
    pub const DISPLAY_ON: u8 = 0x04;
    pub const TWO_LINE: u8 = 0x08;
    pub const FOUR_BIT_MODE: u8 = 0x00;
    pub const FONT_5X8: u8 = 0x00;
}

/// Expander control bits
mod bits {
    pub const RS: u8 = 0b0000_0001;
    pub const EN: u8 = 0b0000_0100;
    pub const BACKLIGHT: u8 = 0b0000_1000;
}

/// DDRAM offset of the first column of each row
const ROW_OFFSETS: [u8; ROWS as usize] = [0x00, 0x40, 0x14, 0x54];

/// 20x4 character display driver
pub struct Lcd2004 {
    i2c: I2c,
}

impl Lcd2004 {
    /// Open the I2C bus and run the controller's 4-bit init sequence
    pub fn new(bus: u8, address: u16) -> Result<Self, DisplayError> {
        let mut i2c = I2c::with_bus(bus)?;
        i2c.set_slave_address(address)?;

        tracing::debug!("I2C initialized: bus={}, address={:#04x}", bus, address);

        let mut lcd = Self { i2c };
        lcd.init()?;
        Ok(lcd)
    }

    /// Put the controller into 4-bit, two-line mode with the display on
    fn init(&mut self) -> Result<(), DisplayError> {
        tracing::info!("Initializing HD44780 display ({}x{})", COLUMNS, ROWS);

        // Reset into a known state, then switch the bus to 4-bit
        self.send(0x03, 0)?;
        self.send(0x03, 0)?;
        self.send(0x03, 0)?;
        self.send(0x02, 0)?;

        self.send(
            cmd::FUNCTION_SET | cmd::TWO_LINE | cmd::FONT_5X8 | cmd::FOUR_BIT_MODE,
            0,
        )?;
        self.send(cmd::DISPLAY_CONTROL | cmd::DISPLAY_ON, 0)?;
        self.send(CMD_CLEAR, 0)?;
        self.send(cmd::ENTRY_MODE_SET | cmd::ENTRY_LEFT, 0)?;
        thread::sleep(Duration::from_millis(200));

        Ok(())
    }

    /// Write a raw byte to the expander with the backlight kept on
    fn expander_write(&mut self, data: u8) -> Result<(), DisplayError> {
        self.i2c.write(&[data | bits::BACKLIGHT])?;
        thread::sleep(Duration::from_micros(100));
        Ok(())
    }

    /// Latch the current nibble into the controller
    fn strobe(&mut self, data: u8) -> Result<(), DisplayError> {
        self.expander_write(data | bits::EN)?;
        thread::sleep(Duration::from_micros(500));
        self.expander_write(data & !bits::EN)?;
        thread::sleep(Duration::from_micros(100));
        Ok(())
    }

    fn write_four_bits(&mut self, data: u8) -> Result<(), DisplayError> {
        self.expander_write(data)?;
        self.strobe(data)
    }

    /// Send a full byte as two nibbles, high first
    ///
    /// `mode` is 0 for instructions or `bits::RS` for character data.
    fn send(&mut self, value: u8, mode: u8) -> Result<(), DisplayError> {
        self.write_four_bits(mode | (value & 0xF0))?;
        self.write_four_bits(mode | ((value << 4) & 0xF0))
    }
}

impl CharDisplay for Lcd2004 {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.send(CMD_CLEAR, 0)?;
        self.send(cmd::RETURN_HOME, 0)
    }

    fn write_command(&mut self, code: u8) -> Result<(), DisplayError> {
        self.send(code, 0)
    }

    fn write_line(&mut self, text: &str, row: u8) -> Result<(), DisplayError> {
        let offset = row
            .checked_sub(1)
            .and_then(|idx| ROW_OFFSETS.get(idx as usize))
            .ok_or(DisplayError::InvalidRow(row))?;

        self.send(cmd::SET_DDRAM_ADDR | offset, 0)?;

        // The controller's ROM only covers single bytes; anything outside
        // ASCII is shown as '?'.
        for ch in text.chars() {
            let byte = if ch.is_ascii() { ch as u8 } else { b'?' };
            self.send(byte, bits::RS)?;
        }
        Ok(())
    }
}
