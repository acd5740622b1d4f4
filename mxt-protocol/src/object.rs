//! Information block and object table layouts
//!
//! Address 0 of every maXTouch holds the information block followed by the
//! object table and a 24-bit CRC:
//!
//! ```text
//! ┌────────────┬─────────────────────────────┬─────────┐
//! │ INFO (7B)  │ OBJECT ENTRY (6B) × N       │ CRC (3B)│
//! └────────────┴─────────────────────────────┴─────────┘
//! ```
//!
//! Object entry layout:
//! - TYPE (1 byte)
//! - START ADDRESS (2 bytes, little-endian)
//! - SIZE - 1 (1 byte)
//! - INSTANCES - 1 (1 byte)
//! - REPORT IDS per instance (1 byte)

/// Object type identifiers
pub mod object_type {
    /// Message processor, the message buffer window
    pub const GEN_MESSAGE_T5: u8 = 5;
    /// Command processor (reset, backup, calibrate)
    pub const GEN_COMMAND_T6: u8 = 6;
    /// Power configuration (idle/active acquisition intervals)
    pub const GEN_POWER_T7: u8 = 7;
    /// Legacy multiple touch screen
    pub const TOUCH_MULTI_T9: u8 = 9;
    /// GPIO/PWM support
    pub const SPT_GPIOPWM_T19: u8 = 19;
    /// Message count helper
    pub const SPT_MESSAGECOUNT_T44: u8 = 44;
    /// Multiple touch touchscreen
    pub const TOUCH_MULTITOUCHSCREEN_T100: u8 = 100;
}

/// Size of the information block in bytes
pub const INFO_SIZE: usize = 7;

/// Size of one object table entry in bytes
pub const ENTRY_SIZE: usize = 6;

/// Upper bound on the object count accepted from a chip
pub const MAX_OBJECTS: usize = 1024;

/// Errors decoding table structures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayoutError {
    /// Input slice shorter than the structure
    Truncated,
}

/// Information block at address 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InfoBlock {
    /// Chip family
    pub family: u8,
    /// Chip variant
    pub variant: u8,
    /// Firmware version (major in the high nibble)
    pub version: u8,
    /// Firmware build
    pub build: u8,
    /// X channels on the sensor matrix
    pub matrix_x_size: u8,
    /// Y channels on the sensor matrix
    pub matrix_y_size: u8,
    /// Number of entries in the object table
    pub num_objects: u8,
}

impl InfoBlock {
    /// Decode from the first [`INFO_SIZE`] bytes
    pub fn parse(bytes: &[u8]) -> Result<Self, LayoutError> {
        if bytes.len() < INFO_SIZE {
            return Err(LayoutError::Truncated);
        }

        Ok(Self {
            family: bytes[0],
            variant: bytes[1],
            version: bytes[2],
            build: bytes[3],
            matrix_x_size: bytes[4],
            matrix_y_size: bytes[5],
            num_objects: bytes[6],
        })
    }

    /// Encode into wire order
    pub fn to_bytes(&self) -> [u8; INFO_SIZE] {
        [
            self.family,
            self.variant,
            self.version,
            self.build,
            self.matrix_x_size,
            self.matrix_y_size,
            self.num_objects,
        ]
    }

    /// Size of information block plus object table, excluding the CRC
    pub fn table_size(&self) -> usize {
        table_size(self.num_objects as usize)
    }

    /// Firmware that keeps the checksum byte at the end of every message
    ///
    /// The first mXT224 firmware (family 0x80, before V2.0) appends a CRC
    /// byte to each T5 message which must be read to keep reads aligned.
    pub fn messages_carry_crc(&self) -> bool {
        self.family == 0x80 && self.version < 0x20
    }
}

/// Size of information block plus `num_objects` entries
pub const fn table_size(num_objects: usize) -> usize {
    INFO_SIZE + num_objects * ENTRY_SIZE
}

/// One decoded object table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ObjectEntry {
    /// Object type (T number)
    pub object_type: u8,
    /// First register of instance 0
    pub start_address: u16,
    /// Bytes per instance
    pub size: u16,
    /// Number of instances
    pub instances: u16,
    /// Report ids claimed per instance
    pub num_report_ids: u8,
}

impl ObjectEntry {
    /// Decode one entry from [`ENTRY_SIZE`] bytes
    pub fn parse(bytes: &[u8]) -> Result<Self, LayoutError> {
        if bytes.len() < ENTRY_SIZE {
            return Err(LayoutError::Truncated);
        }

        Ok(Self {
            object_type: bytes[0],
            start_address: u16::from_le_bytes([bytes[1], bytes[2]]),
            size: u16::from(bytes[3]) + 1,
            instances: u16::from(bytes[4]) + 1,
            num_report_ids: bytes[5],
        })
    }

    /// Encode into wire order
    ///
    /// `size` and `instances` are stored minus one, so zero values cannot be
    /// represented and are written as if they were one.
    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let addr = self.start_address.to_le_bytes();
        [
            self.object_type,
            addr[0],
            addr[1],
            self.size.saturating_sub(1) as u8,
            self.instances.saturating_sub(1) as u8,
            self.num_report_ids,
        ]
    }

    /// Report ids claimed across all instances
    pub fn total_report_ids(&self) -> u16 {
        u16::from(self.num_report_ids) * self.instances
    }

    /// Register address of `offset` within instance 0
    pub fn register(&self, offset: u16) -> u16 {
        self.start_address.wrapping_add(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_parse() {
        let info = InfoBlock::parse(&[0x80, 0x01, 0x10, 0xAA, 24, 14, 3]).unwrap();
        assert_eq!(info.family, 0x80);
        assert_eq!(info.version, 0x10);
        assert_eq!(info.num_objects, 3);
        assert_eq!(info.table_size(), 7 + 3 * 6);
        assert!(info.messages_carry_crc());
    }

    #[test]
    fn test_info_newer_firmware_has_no_message_crc() {
        let mut info = InfoBlock::default();
        info.family = 0x80;
        info.version = 0x20;
        assert!(!info.messages_carry_crc());

        info.family = 0xA4;
        info.version = 0x10;
        assert!(!info.messages_carry_crc());
    }

    #[test]
    fn test_info_truncated() {
        assert_eq!(InfoBlock::parse(&[0; 6]), Err(LayoutError::Truncated));
    }

    #[test]
    fn test_entry_decodes_minus_one_fields() {
        // T9 at 0x0123, 35 bytes, 1 instance, 10 report ids
        let entry = ObjectEntry::parse(&[9, 0x23, 0x01, 34, 0, 10]).unwrap();
        assert_eq!(entry.object_type, object_type::TOUCH_MULTI_T9);
        assert_eq!(entry.start_address, 0x0123);
        assert_eq!(entry.size, 35);
        assert_eq!(entry.instances, 1);
        assert_eq!(entry.num_report_ids, 10);
        assert_eq!(entry.total_report_ids(), 10);
    }

    #[test]
    fn test_entry_max_size_field() {
        let entry = ObjectEntry::parse(&[37, 0, 0, 0xFF, 0x01, 0]).unwrap();
        assert_eq!(entry.size, 256);
        assert_eq!(entry.instances, 2);
    }

    #[test]
    fn test_entry_bytes_match_wire_layout() {
        let entry = ObjectEntry {
            object_type: 100,
            start_address: 0x0260,
            size: 60,
            instances: 1,
            num_report_ids: 12,
        };
        assert_eq!(entry.to_bytes(), [100, 0x60, 0x02, 59, 0, 12]);
        assert_eq!(ObjectEntry::parse(&entry.to_bytes()).unwrap(), entry);
    }

    #[test]
    fn test_register_offset() {
        let entry = ObjectEntry {
            start_address: 0x0200,
            ..Default::default()
        };
        assert_eq!(entry.register(18), 0x0212);
    }
}
