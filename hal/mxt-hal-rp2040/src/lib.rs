//! RP2040 bindings for the maXTouch HAL
//!
//! Implements the shared `mxt-hal` traits on top of `embassy-rp`:
//!
//! - [`i2c::Rp2040I2c`]: blocking I2C master implementing [`mxt_hal::I2cBus`]

#![no_std]

pub mod i2c;

pub use i2c::{I2cBusError, Rp2040I2c};
