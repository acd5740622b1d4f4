//! maXTouch wire formats
//!
//! Bit-exact layouts shared by the driver core and anything that talks to
//! the host:
//!
//! - [`object`]: information block and object table entries at address 0
//! - [`crc`]: the 24-bit checksum protecting the object table
//! - [`message`]: register offsets and T5 message layouts per object type
//! - [`hid`]: the multitouch input report, feature reports and report
//!   descriptor handed to the host
//!
//! ```text
//! ┌──────────┐  object table   ┌──────────┐   TouchReport   ┌──────┐
//! │ maXTouch │ ──────────────► │ mxt-core │ ──────────────► │ host │
//! │          │  T5 messages    │          │   (hid.rs)      │      │
//! └──────────┘                 └──────────┘                 └──────┘
//! ```
//!
//! Nothing here performs I/O.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod crc;
pub mod hid;
pub mod message;
pub mod object;

pub use crc::{crc24, CRC_SIZE};
pub use hid::{Contact, DeviceMode, FeatureError, FeatureReport, TouchReport, MAX_CONTACTS};
pub use message::{StatusMessage, T100Message, T9Message, REPORT_ID_INVALID};
pub use object::{object_type, InfoBlock, LayoutError, ObjectEntry, ENTRY_SIZE, INFO_SIZE};
