//! Contact tracking and report assembly
//!
//! The tracker keeps the last known state of every contact slot the chip
//! can address. Slots are written unconditionally by touch events (last
//! write wins) and read back by [`ReportBuilder`], which distils them into
//! the ten-contact host report.

use mxt_protocol::hid::{
    Contact, TouchReport, MAX_CONTACTS, STATUS_CONFIDENCE, STATUS_IN_RANGE, STATUS_TIP,
};
use mxt_protocol::message::t9;

use crate::decode::Event;

/// Contact slots tracked
pub const MAX_SLOTS: usize = 20;

/// Last known state of one contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ContactSlot {
    /// T9 flag bits; zero means inactive
    pub flags: u8,
    /// X position
    pub x: u16,
    /// Y position
    pub y: u16,
    /// Touch area
    pub area: u8,
}

impl ContactSlot {
    /// Slot holds a contact to report
    pub fn is_active(&self) -> bool {
        self.flags != 0
    }

    fn status(&self, in_range: bool) -> u8 {
        let range = if in_range { STATUS_IN_RANGE } else { 0 };
        if self.flags & (t9::DETECT | t9::PRESS) != 0 {
            STATUS_TIP | STATUS_CONFIDENCE | range
        } else if self.flags & t9::RELEASE != 0 {
            0
        } else {
            range
        }
    }
}

/// Slot table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactTracker {
    slots: [ContactSlot; MAX_SLOTS],
}

impl Default for ContactTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactTracker {
    /// All slots inactive
    pub const fn new() -> Self {
        Self {
            slots: [ContactSlot {
                flags: 0,
                x: 0,
                y: 0,
                area: 0,
            }; MAX_SLOTS],
        }
    }

    /// Apply a decoded event; only touch events change state
    pub fn apply(&mut self, event: &Event) {
        if let Event::Touch {
            slot,
            flags,
            x,
            y,
            area,
        } = *event
        {
            if let Some(s) = self.slots.get_mut(slot) {
                *s = ContactSlot { flags, x, y, area };
            }
        }
    }

    /// Slot state; out of range indices read as inactive
    pub fn slot(&self, index: usize) -> ContactSlot {
        self.slots.get(index).copied().unwrap_or_default()
    }

    /// All slots
    pub fn slots(&self) -> &[ContactSlot; MAX_SLOTS] {
        &self.slots
    }

    /// Number of active slots
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_active()).count()
    }

    /// Mark every slot inactive
    pub fn clear(&mut self) {
        self.slots = [ContactSlot::default(); MAX_SLOTS];
    }
}

/// Rendering options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RenderOptions {
    /// Set the in-range bit on non-released contacts
    pub in_range: bool,
}

/// Builds host reports from the slot table
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportBuilder {
    options: RenderOptions,
}

impl ReportBuilder {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render active slots in ascending order, at most [`MAX_CONTACTS`]
    ///
    /// Released contacts are emitted once and then cleared. Slots past the
    /// tenth active one are left untouched for a later report.
    pub fn render(&self, contacts: &mut ContactTracker) -> TouchReport {
        let mut report = TouchReport::new();

        for (index, slot) in contacts.slots.iter_mut().enumerate() {
            if report.contacts().len() == MAX_CONTACTS {
                break;
            }
            if !slot.is_active() {
                continue;
            }

            let contact = Contact {
                status: slot.status(self.options.in_range),
                contact_id: index as u8,
                x: slot.x,
                y: slot.y,
                width: u16::from(slot.area),
                height: u16::from(slot.area),
            };
            if report.push(contact).is_err() {
                break;
            }

            if slot.flags & (t9::DETECT | t9::PRESS) == 0 && slot.flags & t9::RELEASE != 0 {
                *slot = ContactSlot::default();
            }
        }

        report
    }
}
