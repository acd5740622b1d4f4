//! Object table rollup
//!
//! The chip describes itself through the information block and object table
//! at address 0. [`parse`] reads both in one transfer, checks the trailing
//! CRC and walks the entries in table order. Report ids are handed out by a
//! single fold over that order, so the same table always yields the same
//! id map.
//!
//! [`ChipProfile`] is the distilled view the rest of the driver works from:
//! addresses and report id ranges of the objects the driver talks to.

use heapless::Vec;
use mxt_hal::RegisterIo;
use mxt_protocol::crc::{crc24, stored_crc, CRC_SIZE};
use mxt_protocol::message::t100;
use mxt_protocol::object::{
    object_type, table_size, InfoBlock, ObjectEntry, ENTRY_SIZE, INFO_SIZE, MAX_OBJECTS,
};

use crate::error::{DeviceError, ParseError};

/// Entries the rollup can hold (the count field is one byte)
pub const MAX_TABLE_OBJECTS: usize = 255;

/// Largest raw table: information block, entries and CRC
pub const MAX_RAW_SIZE: usize = table_size(MAX_TABLE_OBJECTS) + CRC_SIZE;

/// First report id handed out; id 0 is reserved
pub const FIRST_REPORT_ID: u16 = 1;

/// Inclusive range of report ids owned by one object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportIdRange {
    /// First id
    pub min: u16,
    /// Last id
    pub max: u16,
}

impl ReportIdRange {
    /// Whether `id` belongs to this range
    pub fn contains(&self, id: u8) -> bool {
        let id = u16::from(id);
        id >= self.min && id <= self.max
    }

    /// Number of ids in the range
    pub fn len(&self) -> u16 {
        self.max - self.min + 1
    }

    /// Always false; a range holds at least one id
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Assign report ids to `objects` in table order
///
/// The counter starts at [`FIRST_REPORT_ID`]; an object with report ids
/// claims `num_report_ids * instances` consecutive ids. Returns one entry
/// per object plus the counter after the last claim.
pub fn assign_report_ids<const N: usize>(
    objects: &[ObjectEntry],
) -> (Vec<Option<ReportIdRange>, N>, u16) {
    objects.iter().take(N).fold(
        (Vec::new(), FIRST_REPORT_ID),
        |(mut ranges, next), obj| {
            let claimed = obj.total_report_ids();
            let range = (claimed > 0).then(|| ReportIdRange {
                min: next,
                max: next.saturating_add(claimed - 1),
            });
            // Capacity matches the `take(N)` above
            let _ = ranges.push(range);
            (ranges, next.saturating_add(if range.is_some() { claimed } else { 0 }))
        },
    )
}

/// Parsed information block and object table
#[derive(Debug, Clone)]
pub struct Rollup {
    info: InfoBlock,
    objects: Vec<ObjectEntry, MAX_TABLE_OBJECTS>,
    report_ids: Vec<Option<ReportIdRange>, MAX_TABLE_OBJECTS>,
    max_report_id: u16,
    raw: Vec<u8, MAX_RAW_SIZE>,
    crc_valid: bool,
}

/// Reject counts the protocol does not allow
pub fn check_object_count<E>(num_objects: usize) -> Result<(), ParseError<E>> {
    if num_objects > MAX_OBJECTS {
        #[cfg(feature = "defmt")]
        defmt::error!("Object count {} out of range", num_objects);
        return Err(ParseError::ObjectCountOutOfRange(num_objects));
    }
    if num_objects > MAX_TABLE_OBJECTS {
        return Err(ParseError::TableTooLarge);
    }
    Ok(())
}

/// Read and decode the object table
pub fn parse<IO: RegisterIo>(io: &mut IO) -> Result<Rollup, ParseError<IO::Error>> {
    let mut header = [0u8; INFO_SIZE];
    io.read(0, &mut header).map_err(ParseError::Io)?;

    let num_objects = usize::from(header[INFO_SIZE - 1]);
    check_object_count(num_objects)?;

    let mut raw: Vec<u8, MAX_RAW_SIZE> = Vec::new();
    raw.resize(table_size(num_objects) + CRC_SIZE, 0)
        .map_err(|_| ParseError::TableTooLarge)?;
    io.read(0, &mut raw).map_err(ParseError::Io)?;

    Rollup::decode(&raw)
}

impl Rollup {
    /// Decode a raw table (information block, entries and CRC)
    pub fn decode<E>(bytes: &[u8]) -> Result<Self, ParseError<E>> {
        let info = InfoBlock::parse(bytes).map_err(|_| ParseError::Truncated)?;
        let num_objects = usize::from(info.num_objects);
        check_object_count(num_objects)?;

        let body_len = info.table_size();
        let tail = bytes
            .get(body_len..body_len + CRC_SIZE)
            .ok_or(ParseError::Truncated)?;

        let computed = crc24(&bytes[..body_len]);
        let stored = stored_crc([tail[0], tail[1], tail[2]]);
        let crc_valid = computed == stored;
        if crc_valid {
            #[cfg(feature = "defmt")]
            defmt::debug!("Object table CRC ok: {=u32:x}", computed);
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Object table CRC mismatch: computed {=u32:x}, stored {=u32:x}",
                computed,
                stored
            );
        }

        let mut objects = Vec::new();
        for chunk in bytes[INFO_SIZE..body_len].chunks_exact(ENTRY_SIZE) {
            let entry = ObjectEntry::parse(chunk).map_err(|_| ParseError::Truncated)?;
            objects.push(entry).map_err(|_| ParseError::TableTooLarge)?;
        }

        let (report_ids, max_report_id) = assign_report_ids::<MAX_TABLE_OBJECTS>(&objects);

        let mut raw = Vec::new();
        raw.extend_from_slice(&bytes[..body_len + CRC_SIZE])
            .map_err(|_| ParseError::TableTooLarge)?;

        Ok(Self {
            info,
            objects,
            report_ids,
            max_report_id,
            raw,
            crc_valid,
        })
    }

    /// Information block
    pub fn info(&self) -> &InfoBlock {
        &self.info
    }

    /// Entries in table order
    pub fn objects(&self) -> &[ObjectEntry] {
        &self.objects
    }

    /// Report ids of the entry at `index`
    pub fn report_ids(&self, index: usize) -> Option<ReportIdRange> {
        self.report_ids.get(index).copied().flatten()
    }

    /// Report id counter after the fold (last assigned id + 1)
    pub fn max_report_id(&self) -> u16 {
        self.max_report_id
    }

    /// Table bytes as read, including the CRC
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Whether the stored CRC matched the table
    pub fn crc_valid(&self) -> bool {
        self.crc_valid
    }

    /// First entry of `object_type`
    pub fn find(&self, object_type: u8) -> Option<&ObjectEntry> {
        self.objects.iter().find(|o| o.object_type == object_type)
    }

    /// First entry of `object_type` with its report ids
    pub fn find_with_ids(&self, object_type: u8) -> Option<(&ObjectEntry, Option<ReportIdRange>)> {
        let index = self.objects.iter().position(|o| o.object_type == object_type)?;
        Some((&self.objects[index], self.report_ids(index)))
    }
}

/// Touch object generation in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MultitouchMode {
    /// No touch object found
    #[default]
    None,
    /// Legacy T9
    T9,
    /// T100
    T100,
}

/// Register window and report ids of a touch object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchObject {
    /// Start address
    pub address: u16,
    /// Report ids, `None` when the object reports nothing
    pub report_ids: Option<ReportIdRange>,
}

/// Message byte offsets of optional T100 auxiliary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct T100Aux {
    /// Vector byte
    pub vector: Option<u8>,
    /// Amplitude byte
    pub amplitude: Option<u8>,
    /// Area byte
    pub area: Option<u8>,
}

impl T100Aux {
    /// Assign offsets from the TCHAUX register
    ///
    /// Offsets start at byte 6 in the order vector, amplitude, area.
    pub fn from_tchaux(tchaux: u8) -> Self {
        let mut next = t100::AUX_START;
        let mut take = |bit: u8| {
            (tchaux & bit != 0).then(|| {
                let offset = next;
                next += 1;
                offset
            })
        };

        let vector = take(t100::TCHAUX_VECT);
        let amplitude = take(t100::TCHAUX_AMPL);
        let area = take(t100::TCHAUX_AREA);
        Self {
            vector,
            amplitude,
            area,
        }
    }
}

/// Objects and geometry of a booted chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipProfile {
    /// Message processor window
    pub t5_address: u16,
    /// Bytes per message
    pub t5_msg_size: usize,
    /// Command processor
    pub t6_address: u16,
    /// Report id of command processor status messages
    pub t6_report_id: Option<u16>,
    /// Power configuration
    pub t7_address: Option<u16>,
    /// Legacy touch object
    pub t9: Option<TouchObject>,
    /// Report id of GPIO/PWM messages
    pub t19_report_id: Option<u16>,
    /// Message count object
    pub t44_address: Option<u16>,
    /// Touchscreen object
    pub t100: Option<TouchObject>,
    /// Touch generation, last touch object in table order wins
    pub multitouch: MultitouchMode,
    /// Contacts the touch object can report
    pub num_touch_ids: u16,
    /// Report id counter after assignment
    pub max_report_id: u16,
    /// Logical X extent
    pub max_x: u16,
    /// Logical Y extent
    pub max_y: u16,
    /// T100 auxiliary data layout
    pub t100_aux: T100Aux,
}

impl ChipProfile {
    /// Build the profile from a rollup
    ///
    /// T6 and T5 are required. Screen geometry is zero until the touch
    /// object configuration has been read.
    pub fn from_rollup<E>(rollup: &Rollup) -> Result<Self, DeviceError<E>> {
        let (t6, t6_ids) = rollup
            .find_with_ids(object_type::GEN_COMMAND_T6)
            .ok_or(DeviceError::MissingRequiredObject(object_type::GEN_COMMAND_T6))?;
        let t5 = rollup
            .find(object_type::GEN_MESSAGE_T5)
            .ok_or(DeviceError::MissingRequiredObject(object_type::GEN_MESSAGE_T5))?;

        // A message always carries at least its report id
        let t5_msg_size = if rollup.info().messages_carry_crc() {
            usize::from(t5.size)
        } else {
            usize::from(t5.size.saturating_sub(1)).max(1)
        };

        let mut profile = Self {
            t5_address: t5.start_address,
            t5_msg_size,
            t6_address: t6.start_address,
            t6_report_id: t6_ids.map(|r| r.min),
            t7_address: None,
            t9: None,
            t19_report_id: None,
            t44_address: None,
            t100: None,
            multitouch: MultitouchMode::None,
            num_touch_ids: 0,
            max_report_id: rollup.max_report_id(),
            max_x: 0,
            max_y: 0,
            t100_aux: T100Aux::default(),
        };

        for (index, obj) in rollup.objects().iter().enumerate() {
            let ids = rollup.report_ids(index);
            match obj.object_type {
                object_type::GEN_POWER_T7 => {
                    profile.t7_address.get_or_insert(obj.start_address);
                }
                object_type::TOUCH_MULTI_T9 => {
                    profile.t9 = Some(TouchObject {
                        address: obj.start_address,
                        report_ids: ids,
                    });
                    profile.multitouch = MultitouchMode::T9;
                    profile.num_touch_ids = obj.total_report_ids();
                }
                object_type::SPT_GPIOPWM_T19 => {
                    profile.t19_report_id = ids.map(|r| r.min);
                }
                object_type::SPT_MESSAGECOUNT_T44 => {
                    profile.t44_address.get_or_insert(obj.start_address);
                }
                object_type::TOUCH_MULTITOUCHSCREEN_T100 => {
                    profile.t100 = Some(TouchObject {
                        address: obj.start_address,
                        report_ids: ids,
                    });
                    profile.multitouch = MultitouchMode::T100;
                    profile.num_touch_ids = u16::from(obj.num_report_ids)
                        .saturating_sub(u16::from(t100::NON_TOUCH_IDS));
                }
                _ => {}
            }
        }

        Ok(profile)
    }

    /// Little-endian X extent for the report descriptor
    pub fn max_x_hid(&self) -> [u8; 2] {
        self.max_x.to_le_bytes()
    }

    /// Little-endian Y extent for the report descriptor
    pub fn max_y_hid(&self) -> [u8; 2] {
        self.max_y.to_le_bytes()
    }

    /// Whether the chip has a T44 message count object
    pub fn has_message_count(&self) -> bool {
        self.t44_address.is_some()
    }
}
