//! maXTouch Hardware Abstraction Layer
//!
//! This crate defines the bus traits the touch core talks through. Chip
//! specific HALs (RP2040, ...) implement [`I2cBus`]; the core only ever
//! sees [`RegisterIo`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  mxt-core (object table, pump, slots)   │
//! └─────────────────────────────────────────┘
//!                     │ RegisterIo
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  mxt-hal (this crate - traits)          │
//! └─────────────────────────────────────────┘
//!                     │ I2cBus
//!                     ▼
//!             ┌───────────────┐
//!             │ mxt-hal-rp2040│
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`register::RegisterIo`] - 16-bit addressed register reads and writes
//! - [`i2c::I2cBus`] - I2C bus operations

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
pub mod register;

pub use i2c::{I2cBus, I2cConfig};
pub use register::{I2cRegisters, RegisterError, RegisterIo, MAX_WRITE_LEN};
