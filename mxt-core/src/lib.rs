//! Board-agnostic maXTouch driver core
//!
//! Everything between the register bus and the host report lives here:
//!
//! - Object table parsing and report id assignment ([`object`])
//! - Boot, resume and power-down sequencing ([`boot`])
//! - Message retrieval, count-prefixed or drained ([`pump`])
//! - Per-object message decoding ([`decode`])
//! - Contact slots and report assembly ([`contact`])
//! - The device context tying it together ([`device`])
//! - Configuration types and parsing ([`config`])
//!
//! The bus is reached only through [`mxt_hal::RegisterIo`], so the same code
//! runs on target and against the simulated chip in host tests.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod config;
pub mod contact;
pub mod decode;
pub mod device;
pub mod error;
pub mod object;
pub mod pump;

#[cfg(test)]
pub mod sim;

pub use boot::{BootSequencer, BootState, BootToken};
pub use config::DriverConfig;
pub use contact::{ContactTracker, RenderOptions, ReportBuilder, MAX_SLOTS};
pub use decode::{decode, Event};
pub use device::{Device, ReportSink};
pub use error::{DeviceError, ParseError};
pub use object::{ChipProfile, MultitouchMode, ReportIdRange, Rollup};
pub use pump::{MessagePump, ReadStrategy};
