//! Message decoding
//!
//! Turns one raw T5 message into an [`Event`]. The report id selects the
//! object that produced it; anything the driver does not track decodes to
//! [`Event::None`].

use mxt_protocol::message::{t9, StatusMessage, T100Message, T9Message, REPORT_ID_INVALID};

use crate::contact::{ContactTracker, MAX_SLOTS};
use crate::object::ChipProfile;

/// Coordinates above this are already in 12-bit resolution
const TEN_BIT_LIMIT: u16 = 1024;

/// Area reported for T100 contacts; the aux area byte is not consumed
pub const T100_DEFAULT_AREA: u8 = 10;

/// Decoded message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Nothing to apply
    None,
    /// Command processor status
    Status { status: u8, config_crc: u32 },
    /// Contact update in T9 flag terms
    Touch {
        slot: usize,
        flags: u8,
        x: u16,
        y: u16,
        area: u8,
    },
}

/// Decode one message
///
/// `contacts` supplies the previous state of T100 slots, which carry no
/// release flag of their own.
pub fn decode(raw: &[u8], profile: &ChipProfile, contacts: &ContactTracker) -> Event {
    let Some(&report_id) = raw.first() else {
        return Event::None;
    };
    if report_id == REPORT_ID_INVALID {
        return Event::None;
    }
    let id = u16::from(report_id);

    if profile.t6_report_id == Some(id) {
        return decode_status(raw);
    }

    if let Some(range) = profile.t9.and_then(|t| t.report_ids) {
        if range.contains(report_id) {
            return decode_t9(raw, profile);
        }
    }

    if let Some(range) = profile.t100.and_then(|t| t.report_ids) {
        if range.contains(report_id) {
            return decode_t100(raw, range.min, contacts);
        }
    }

    Event::None
}

fn decode_status(raw: &[u8]) -> Event {
    match StatusMessage::parse(raw) {
        Some(msg) => {
            #[cfg(feature = "defmt")]
            defmt::info!(
                "T6 status {=u8:#x}, config crc {=u32:x}",
                msg.status,
                msg.config_crc
            );
            Event::Status {
                status: msg.status,
                config_crc: msg.config_crc,
            }
        }
        None => Event::None,
    }
}

fn decode_t9(raw: &[u8], profile: &ChipProfile) -> Event {
    let Some(msg) = T9Message::parse(raw) else {
        return Event::None;
    };

    // T9 contacts occupy the slot of their report id
    let slot = usize::from(msg.report_id);
    if slot >= MAX_SLOTS {
        return Event::None;
    }

    let mut x = msg.x;
    let mut y = msg.y;
    if profile.max_x < TEN_BIT_LIMIT {
        x >>= 2;
    }
    if profile.max_y < TEN_BIT_LIMIT {
        y >>= 2;
    }

    Event::Touch {
        slot,
        flags: msg.flags,
        x,
        y,
        area: msg.area,
    }
}

fn decode_t100(raw: &[u8], min_id: u16, contacts: &ContactTracker) -> Event {
    let Some(msg) = T100Message::parse(raw) else {
        return Event::None;
    };

    // The first two ids of the range are not contacts
    let offset = i32::from(msg.report_id) - i32::from(min_id) - 2;
    let Ok(slot) = usize::try_from(offset) else {
        return Event::None;
    };
    if slot >= MAX_SLOTS {
        return Event::None;
    }

    let flags = if msg.is_detect() {
        t9::DETECT
    } else if contacts.slot(slot).flags & t9::DETECT != 0 {
        t9::RELEASE
    } else {
        0
    };

    Event::Touch {
        slot,
        flags,
        x: msg.x,
        y: msg.y,
        area: T100_DEFAULT_AREA,
    }
}
