//! An `embedded-hal`-based driver for AT24-series I2C EEPROMs.
//!
//! Scalars (`u8`, `u16`, `u32`, stored big-endian) and byte ranges can be
//! read and written at any position. Bulk transfers are split so no bus
//! transaction crosses a device page, every committing write waits for the
//! previous write cycle to finish, and scalar writes are skipped when the
//! stored value is already correct.
//!
//! The driver talks to the bus through the [`Wire`] transaction model;
//! [`I2cWire`] and [`AsyncI2cWire`] provide it for any embedded-hal I2C bus.
//!
//! ```ignore
//! use at24_i2c_eeprom_rs::{Eeprom, EepromI2c, I2cWire};
//!
//! let mut eeprom = EepromI2c::new(I2cWire::new(i2c), 0x50, 32);
//! eeprom.write16(0x10, 0xbeef)?;
//! assert_eq!(eeprom.read16(0x10)?, 0xbeef);
//! ```
#![cfg_attr(not(test), no_std)]
#![warn(missing_debug_implementations, rust_2018_idioms)]

#[macro_use]
mod fmt;

pub mod async_comms;
pub mod comms;
pub mod config;
pub mod error;
pub mod traits;
pub mod wire;

#[cfg(test)]
mod sim;

pub use async_comms::AsyncEepromI2c;
pub use comms::EepromI2c;
pub use config::{EepromConfig, ReadyPolicy, DEFAULT_MAX_PROBES, WIRE_BUFFER_LEN};
pub use error::Error;
pub use traits::{AsyncEeprom, AsyncWire, Eeprom, EepromPosition, Status, Wire};
pub use wire::{AsyncI2cWire, I2cWire};
