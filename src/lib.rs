//! Clock and network status for a 20x4 I2C character LCD.
//!
//! - A background task redraws the date and time on the bottom row
//! - The foreground loop alternates wired and wireless status pages
//! - All device access is serialized through [`display::DisplayGuard`]

pub mod clock;
pub mod config;
pub mod display;
pub mod net;
pub mod status;
pub mod supervisor;
