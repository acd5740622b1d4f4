//! Object register offsets and T5 message layouts
//!
//! Every message read from the T5 window starts with the report id that
//! identifies the object instance which produced it. The remaining bytes are
//! object specific:
//!
//! ```text
//! T6   │ ID │ STATUS │ CONFIG CRC (3B, LE)                │
//! T9   │ ID │ FLAGS  │ X[11:4] │ Y[11:4] │ X/Y[3:0] │ AREA │
//! T100 │ ID │ STATUS │ X (2B, LE)   │ Y (2B, LE)   │ AUX… │
//! ```

/// Report id of an empty message slot
pub const REPORT_ID_INVALID: u8 = 0xFF;

/// Command processor (T6) registers and status bits
pub mod t6 {
    /// Offset of the reset command byte
    pub const RESET: u16 = 0;
    /// Offset of the backup command byte
    pub const BACKUP_NV: u16 = 1;
    /// Offset of the calibrate command byte
    pub const CALIBRATE: u16 = 2;

    /// Value written to [`RESET`] for a soft reset
    pub const RESET_VALUE: u8 = 1;

    /// Device has reset
    pub const STATUS_RESET: u8 = 0x80;
    /// Message buffer overflow
    pub const STATUS_OFL: u8 = 0x40;
    /// Signal error
    pub const STATUS_SIGERR: u8 = 0x20;
    /// Calibration in progress
    pub const STATUS_CAL: u8 = 0x10;
    /// Configuration error
    pub const STATUS_CFGERR: u8 = 0x08;
    /// Communication error
    pub const STATUS_COMSERR: u8 = 0x04;
}

/// Power configuration (T7) registers
pub mod t7 {
    /// Offset of the idle acquisition interval
    pub const IDLE_ACQ_INT: u16 = 0;
    /// Offset of the active acquisition interval
    pub const ACTV_ACQ_INT: u16 = 1;
}

/// Legacy multitouch (T9) registers and message flags
pub mod t9 {
    /// Control byte
    pub const CTRL: u16 = 0;
    /// Matrix X size
    pub const XSIZE: u16 = 3;
    /// Matrix Y size
    pub const YSIZE: u16 = 4;
    /// Orientation byte
    pub const ORIENT: u16 = 9;
    /// X and Y ranges, two little-endian words
    pub const RANGE: u16 = 18;

    /// Orientation bit that swaps X and Y
    pub const ORIENT_SWITCH: u8 = 0x01;

    /// CTRL value that enables the object with message reporting
    pub const CTRL_RUN: u8 = 0x83;
    /// CTRL value that disables the object
    pub const CTRL_OFF: u8 = 0x00;

    /// Range used when the chip reports zero
    pub const DEFAULT_RANGE: u16 = 1023;

    /// Contact detected
    pub const DETECT: u8 = 0x80;
    /// Contact pressed in this cycle
    pub const PRESS: u8 = 0x40;
    /// Contact released in this cycle
    pub const RELEASE: u8 = 0x20;
    /// Contact moved
    pub const MOVE: u8 = 0x10;
    /// Vector report
    pub const VECTOR: u8 = 0x08;
    /// Amplitude changed
    pub const AMP: u8 = 0x04;
    /// Contact suppressed
    pub const SUPPRESS: u8 = 0x02;
    /// Ungrip
    pub const UNGRIP: u8 = 0x01;
}

/// Multitouch touchscreen (T100) registers and message bits
pub mod t100 {
    /// Configuration byte 1
    pub const CFG1: u16 = 1;
    /// Auxiliary data selection
    pub const TCHAUX: u16 = 3;
    /// X range, little-endian word
    pub const XRANGE: u16 = 13;
    /// Y range, little-endian word
    pub const YRANGE: u16 = 24;

    /// CFG1 bit that swaps X and Y
    pub const CFG_SWITCHXY: u8 = 0x20;

    /// TCHAUX bit: vector data present
    pub const TCHAUX_VECT: u8 = 0x02;
    /// TCHAUX bit: amplitude data present
    pub const TCHAUX_AMPL: u8 = 0x04;
    /// TCHAUX bit: area data present
    pub const TCHAUX_AREA: u8 = 0x08;

    /// First message byte used for auxiliary data
    pub const AUX_START: u8 = 6;

    /// Status bit: contact detected
    pub const DETECT: u8 = 0x80;

    /// Report ids of a T100 instance that carry no contact
    ///
    /// The first two ids of the range are the screen status and reserved
    /// messages.
    pub const NON_TOUCH_IDS: u8 = 2;
}

/// Command processor status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusMessage {
    /// T6 status bits
    pub status: u8,
    /// 24-bit checksum of the chip configuration
    pub config_crc: u32,
}

impl StatusMessage {
    /// Bytes required to decode
    pub const LEN: usize = 5;

    /// Decode from a raw message, `None` when too short
    pub fn parse(msg: &[u8]) -> Option<Self> {
        if msg.len() < Self::LEN {
            return None;
        }

        Some(Self {
            status: msg[1],
            config_crc: u32::from(msg[2]) | (u32::from(msg[3]) << 8) | (u32::from(msg[4]) << 16),
        })
    }
}

/// T9 touch message with 12-bit coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct T9Message {
    /// Report id
    pub report_id: u8,
    /// [`t9`] flag bits
    pub flags: u8,
    /// X, 12 bits
    pub x: u16,
    /// Y, 12 bits
    pub y: u16,
    /// Touch area
    pub area: u8,
}

impl T9Message {
    /// Bytes required to decode
    pub const LEN: usize = 6;

    /// Decode from a raw message, `None` when too short
    pub fn parse(msg: &[u8]) -> Option<Self> {
        if msg.len() < Self::LEN {
            return None;
        }

        Some(Self {
            report_id: msg[0],
            flags: msg[1],
            x: (u16::from(msg[2]) << 4) | (u16::from(msg[4]) >> 4),
            y: (u16::from(msg[3]) << 4) | (u16::from(msg[4]) & 0x0F),
            area: msg[5],
        })
    }
}

/// T100 touch message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct T100Message {
    /// Report id
    pub report_id: u8,
    /// Status byte; bit 7 is [`t100::DETECT`]
    pub status: u8,
    /// X position
    pub x: u16,
    /// Y position
    pub y: u16,
}

impl T100Message {
    /// Bytes required to decode
    pub const LEN: usize = 6;

    /// Decode from a raw message, `None` when too short
    pub fn parse(msg: &[u8]) -> Option<Self> {
        if msg.len() < Self::LEN {
            return None;
        }

        Some(Self {
            report_id: msg[0],
            status: msg[1],
            x: u16::from_le_bytes([msg[2], msg[3]]),
            y: u16::from_le_bytes([msg[4], msg[5]]),
        })
    }

    /// Whether the contact is currently on the screen
    pub fn is_detect(&self) -> bool {
        self.status & t100::DETECT != 0
    }
}
