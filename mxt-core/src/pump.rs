//! Message pump
//!
//! Decides how many messages to pull from the T5 window per interrupt and
//! feeds them through the decoder into the contact tracker.
//!
//! Two strategies, chosen once from the chip profile:
//!
//! - **CountPrefixed**: chips with T44 report the number of pending messages
//!   in the byte just before T5. One read returns the count and the first
//!   message; the remainder is fetched in a single batch.
//! - **Drain**: without T44 the pump guesses from the previous interrupt,
//!   reads one extra message and keeps reading in pairs until an empty slot
//!   (report id `0xFF`) shows up.

use mxt_hal::RegisterIo;
use mxt_protocol::message::REPORT_ID_INVALID;

use crate::contact::ContactTracker;
use crate::decode::decode;
use crate::object::ChipProfile;

/// Bytes available for one batch read
pub const MESSAGE_BUFFER_SIZE: usize = 2048;

/// Full batch reads attempted while draining stale messages at boot
const BOOT_DRAIN_TRIES: u8 = 2;

/// How pending messages are discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadStrategy {
    /// T44 holds the pending count
    CountPrefixed,
    /// Read until an invalid message
    Drain,
}

impl ReadStrategy {
    /// Strategy supported by the chip
    pub fn for_profile(profile: &ChipProfile) -> Self {
        if profile.has_message_count() {
            Self::CountPrefixed
        } else {
            Self::Drain
        }
    }
}

/// Reads and dispatches T5 messages
pub struct MessagePump {
    strategy: ReadStrategy,
    last_message_count: usize,
    buf: [u8; MESSAGE_BUFFER_SIZE],
}

impl MessagePump {
    /// Create a pump for the given chip
    pub fn new(profile: &ChipProfile) -> Self {
        Self {
            strategy: ReadStrategy::for_profile(profile),
            last_message_count: 0,
            buf: [0xFF; MESSAGE_BUFFER_SIZE],
        }
    }

    /// Strategy in use
    pub fn strategy(&self) -> ReadStrategy {
        self.strategy
    }

    /// Valid messages seen by the last drain
    pub fn last_message_count(&self) -> usize {
        self.last_message_count
    }

    /// Read `count` messages from T5 in one transfer and apply them
    ///
    /// Returns how many carried a valid report id. Requests above the
    /// chip's report id count are refused; requests larger than the buffer
    /// are shortened.
    pub fn read_messages<IO: RegisterIo>(
        &mut self,
        io: &mut IO,
        profile: &ChipProfile,
        contacts: &mut ContactTracker,
        count: usize,
    ) -> Result<usize, IO::Error> {
        if count > usize::from(profile.max_report_id) {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Refusing to read {} messages, chip has {} report ids",
                count,
                profile.max_report_id
            );
            return Ok(0);
        }

        let msg_size = profile.t5_msg_size.max(1);
        let capacity = MESSAGE_BUFFER_SIZE / msg_size;
        let count = if count > capacity {
            #[cfg(feature = "defmt")]
            defmt::warn!("Message batch of {} clamped to {}", count, capacity);
            capacity
        } else {
            count
        };
        if count == 0 {
            return Ok(0);
        }

        let len = msg_size * count;
        let buf = &mut self.buf[..len];
        buf.fill(0xFF);
        io.read(profile.t5_address, buf)?;

        Ok(dispatch(buf, msg_size, profile, contacts))
    }

    /// Service one interrupt with the chip's strategy
    ///
    /// Returns the number of valid messages processed.
    pub fn pump<IO: RegisterIo>(
        &mut self,
        io: &mut IO,
        profile: &ChipProfile,
        contacts: &mut ContactTracker,
    ) -> Result<usize, IO::Error> {
        match self.strategy {
            ReadStrategy::CountPrefixed => self.read_count_prefixed(io, profile, contacts),
            ReadStrategy::Drain => self.read_drain(io, profile, contacts),
        }
    }

    fn read_count_prefixed<IO: RegisterIo>(
        &mut self,
        io: &mut IO,
        profile: &ChipProfile,
        contacts: &mut ContactTracker,
    ) -> Result<usize, IO::Error> {
        let Some(t44) = profile.t44_address else {
            return Ok(0);
        };

        // T44 and T5 are adjacent: count byte then the first message
        let msg_size = profile.t5_msg_size.clamp(1, MESSAGE_BUFFER_SIZE);
        let head = &mut self.buf[..msg_size];
        head.fill(0xFF);
        io.read(t44, head)?;

        let pending = usize::from(head[0]).min(usize::from(profile.max_report_id));
        if pending == 0 {
            return Ok(0);
        }

        let first = &head[1..];
        let mut valid = 0;
        if first.first().is_some_and(|&id| id != REPORT_ID_INVALID) {
            valid += 1;
        }
        let event = decode(first, profile, contacts);
        contacts.apply(&event);

        if pending > 1 {
            valid += self.read_messages(io, profile, contacts, pending - 1)?;
        }
        Ok(valid)
    }

    fn read_drain<IO: RegisterIo>(
        &mut self,
        io: &mut IO,
        profile: &ChipProfile,
        contacts: &mut ContactTracker,
    ) -> Result<usize, IO::Error> {
        let mut count = self.last_message_count;
        if count < 1 || count > usize::from(profile.max_report_id) {
            count = 1;
        }

        // Include the final invalid message
        let mut total = self.read_messages(io, profile, contacts, count + 1)?;

        if total > count {
            // Keep reading two at a time until one is invalid or every
            // contact has reported
            loop {
                let handled = self.read_messages(io, profile, contacts, 2)?;
                total += handled;
                if handled < 2 || total >= usize::from(profile.num_touch_ids) {
                    break;
                }
            }
        }

        self.last_message_count = total;
        Ok(total)
    }

    /// Empty the chip's message queue after boot
    ///
    /// Reads up to `max_report_id` messages, twice at most, stopping at the
    /// first short batch. Returns false if the queue never ran dry.
    pub fn drain_stale<IO: RegisterIo>(
        &mut self,
        io: &mut IO,
        profile: &ChipProfile,
        contacts: &mut ContactTracker,
    ) -> Result<bool, IO::Error> {
        let count = usize::from(profile.max_report_id);
        for _ in 0..BOOT_DRAIN_TRIES {
            if self.read_messages(io, profile, contacts, count)? < count {
                return Ok(true);
            }
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("Message queue still full after boot drain");
        Ok(false)
    }
}

/// Decode and apply each message of a batch, counting valid report ids
fn dispatch(
    buf: &[u8],
    msg_size: usize,
    profile: &ChipProfile,
    contacts: &mut ContactTracker,
) -> usize {
    let mut valid = 0;
    for msg in buf.chunks_exact(msg_size) {
        if msg[0] != REPORT_ID_INVALID {
            valid += 1;
        }
        let event = decode(msg, profile, contacts);
        contacts.apply(&event);
    }
    valid
}
