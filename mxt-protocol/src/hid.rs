//! HID multitouch wire schema
//!
//! The host side consumes a fixed digitizer layout: one input report with
//! ten contact records and a contact count, a feature report for the device
//! mode and one for the maximum contact count.
//!
//! ```text
//! Touch report (102 bytes, packed)
//! ┌────┬──────────────────────────────────────────────┬───────┐
//! │ ID │ CONTACT × 10                                 │ COUNT │
//! │ 1B │ STATUS │ CID │ X │ Y │ WIDTH │ HEIGHT (LE16) │ 1B    │
//! └────┴──────────────────────────────────────────────┴───────┘
//! ```

use heapless::Vec;

/// Input report id for touch data, also used by the max-count feature
pub const REPORT_ID_TOUCH: u8 = 0x01;

/// Feature report id for the device mode
pub const REPORT_ID_FEATURE: u8 = 0x02;

/// Contacts carried by one touch report
pub const MAX_CONTACTS: usize = 10;

/// Contact status: finger touching
pub const STATUS_TIP: u8 = 0x01;
/// Contact status: contact is intentional
pub const STATUS_CONFIDENCE: u8 = 0x02;
/// Contact status: finger within sensing range
pub const STATUS_IN_RANGE: u8 = 0x04;

/// Encoded size of one contact record
pub const CONTACT_LEN: usize = 10;

/// Encoded size of a touch report
pub const TOUCH_REPORT_LEN: usize = 1 + MAX_CONTACTS * CONTACT_LEN + 1;

/// One contact in a touch report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Contact {
    /// `STATUS_*` bits
    pub status: u8,
    /// Stable identifier, the tracker slot index
    pub contact_id: u8,
    /// X position
    pub x: u16,
    /// Y position
    pub y: u16,
    /// Contact width
    pub width: u16,
    /// Contact height
    pub height: u16,
}

impl Contact {
    fn encode_into(&self, out: &mut [u8]) {
        out[0] = self.status;
        out[1] = self.contact_id;
        out[2..4].copy_from_slice(&self.x.to_le_bytes());
        out[4..6].copy_from_slice(&self.y.to_le_bytes());
        out[6..8].copy_from_slice(&self.width.to_le_bytes());
        out[8..10].copy_from_slice(&self.height.to_le_bytes());
    }
}

/// Multitouch input report
///
/// Contacts are kept in the order they were pushed; unused records encode as
/// zeros.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchReport {
    contacts: Vec<Contact, MAX_CONTACTS>,
}

impl TouchReport {
    /// Create an empty report
    pub const fn new() -> Self {
        Self {
            contacts: Vec::new(),
        }
    }

    /// Report id on the wire
    pub const fn report_id(&self) -> u8 {
        REPORT_ID_TOUCH
    }

    /// Append a contact, giving it back when the report is full
    pub fn push(&mut self, contact: Contact) -> Result<(), Contact> {
        self.contacts.push(contact)
    }

    /// Contacts in emission order
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Number of valid contacts
    pub fn actual_count(&self) -> u8 {
        self.contacts.len() as u8
    }

    /// No contacts present
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Encode into the packed wire layout
    pub fn encode(&self) -> [u8; TOUCH_REPORT_LEN] {
        let mut out = [0u8; TOUCH_REPORT_LEN];
        out[0] = REPORT_ID_TOUCH;

        for (i, contact) in self.contacts.iter().enumerate() {
            let start = 1 + i * CONTACT_LEN;
            contact.encode_into(&mut out[start..start + CONTACT_LEN]);
        }

        out[TOUCH_REPORT_LEN - 1] = self.actual_count();
        out
    }
}

/// Host-selected input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DeviceMode {
    /// Mouse emulation
    #[default]
    Mouse = 0x00,
    /// Single contact digitizer
    SingleInput = 0x01,
    /// Full multitouch digitizer
    MultiInput = 0x02,
}

impl DeviceMode {
    /// Parse from the wire value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Mouse),
            0x01 => Some(Self::SingleInput),
            0x02 => Some(Self::MultiInput),
            _ => None,
        }
    }
}

/// Errors handling feature reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FeatureError {
    /// Report id has no feature report
    UnknownReport(u8),
    /// Buffer too short for the report
    BadLength,
    /// Device mode byte out of range
    InvalidMode(u8),
}

impl core::fmt::Display for FeatureError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownReport(id) => write!(f, "unknown feature report {}", id),
            Self::BadLength => write!(f, "feature report buffer too short"),
            Self::InvalidMode(mode) => write!(f, "invalid device mode {}", mode),
        }
    }
}

/// Feature reports exchanged with the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FeatureReport {
    /// Maximum simultaneous contacts (report id 1, read only)
    MaxCount { maximum_count: u8 },
    /// Device mode (report id 2)
    Mode { mode: DeviceMode, identifier: u8 },
}

impl FeatureReport {
    /// Max-count reply for this schema
    pub const MAX_COUNT: Self = Self::MaxCount {
        maximum_count: MAX_CONTACTS as u8,
    };

    /// Report id on the wire
    pub fn report_id(&self) -> u8 {
        match self {
            Self::MaxCount { .. } => REPORT_ID_TOUCH,
            Self::Mode { .. } => REPORT_ID_FEATURE,
        }
    }

    /// Encoded length
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::MaxCount { .. } => 2,
            Self::Mode { .. } => 3,
        }
    }

    /// Write into `buf`, returning the bytes used
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, FeatureError> {
        let len = self.encoded_len();
        if buf.len() < len {
            return Err(FeatureError::BadLength);
        }

        buf[0] = self.report_id();
        match self {
            Self::MaxCount { maximum_count } => buf[1] = *maximum_count,
            Self::Mode { mode, identifier } => {
                buf[1] = *mode as u8;
                buf[2] = *identifier;
            }
        }
        Ok(len)
    }

    /// Decode a host set-feature buffer
    pub fn decode(bytes: &[u8]) -> Result<Self, FeatureError> {
        let id = *bytes.first().ok_or(FeatureError::BadLength)?;
        match id {
            REPORT_ID_TOUCH => {
                if bytes.len() < 2 {
                    return Err(FeatureError::BadLength);
                }
                Ok(Self::MaxCount {
                    maximum_count: bytes[1],
                })
            }
            REPORT_ID_FEATURE => {
                if bytes.len() < 3 {
                    return Err(FeatureError::BadLength);
                }
                let mode = DeviceMode::from_u8(bytes[1]).ok_or(FeatureError::InvalidMode(bytes[1]))?;
                Ok(Self::Mode {
                    mode,
                    identifier: bytes[2],
                })
            }
            other => Err(FeatureError::UnknownReport(other)),
        }
    }
}

/// HID device attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceAttributes {
    /// Vendor id
    pub vendor_id: u16,
    /// Product id
    pub product_id: u16,
    /// Version number
    pub version: u16,
}

/// Attributes reported for the touchscreen
pub const DEVICE_ATTRIBUTES: DeviceAttributes = DeviceAttributes {
    vendor_id: 0x00FF,
    product_id: 0xBACC,
    version: 0x0001,
};

// Report descriptor fragments. Each finger collection is
// COLLECTION_HEAD, LOGICAL_MAXIMUM(x), COLLECTION_X, LOGICAL_MAXIMUM(y),
// COLLECTION_TAIL.

const DESCRIPTOR_HEAD: [u8; 10] = [
    0x05, 0x0d, // USAGE_PAGE (Digitizers)
    0x09, 0x04, // USAGE (Touch Screen)
    0xa1, 0x01, // COLLECTION (Application)
    0x85, REPORT_ID_TOUCH, // REPORT_ID (Touch)
    0x09, 0x22, // USAGE (Finger)
];

const COLLECTION_HEAD: [u8; 43] = [
    0xa1, 0x02, // COLLECTION (Logical)
    0x09, 0x42, // USAGE (Tip Switch)
    0x15, 0x00, // LOGICAL_MINIMUM (0)
    0x25, 0x01, // LOGICAL_MAXIMUM (1)
    0x75, 0x01, // REPORT_SIZE (1)
    0x95, 0x01, // REPORT_COUNT (1)
    0x81, 0x02, // INPUT (Data,Var,Abs)
    0x09, 0x47, // USAGE (Confidence)
    0x81, 0x02, // INPUT (Data,Var,Abs)
    0x95, 0x06, // REPORT_COUNT (6)
    0x81, 0x03, // INPUT (Cnst,Ary,Abs)
    0x75, 0x08, // REPORT_SIZE (8)
    0x09, 0x51, // USAGE (Contact Identifier)
    0x95, 0x01, // REPORT_COUNT (1)
    0x81, 0x02, // INPUT (Data,Var,Abs)
    0x05, 0x01, // USAGE_PAGE (Generic Desktop)
    0x75, 0x10, // REPORT_SIZE (16)
    0x55, 0x00, // UNIT_EXPONENT (0)
    0x65, 0x00, // UNIT (None)
    0x35, 0x00, // PHYSICAL_MINIMUM (0)
    0x46, 0x00, 0x00, // PHYSICAL_MAXIMUM (0)
];

const COLLECTION_X: [u8; 4] = [
    0x09, 0x30, // USAGE (X)
    0x81, 0x02, // INPUT (Data,Var,Abs)
];

const COLLECTION_TAIL: [u8; 15] = [
    0x09, 0x31, // USAGE (Y)
    0x81, 0x02, // INPUT (Data,Var,Abs)
    0x05, 0x0d, // USAGE_PAGE (Digitizers)
    0x09, 0x48, // USAGE (Width)
    0x81, 0x02, // INPUT (Data,Var,Abs)
    0x09, 0x49, // USAGE (Height)
    0x81, 0x02, // INPUT (Data,Var,Abs)
    0xc0, // END_COLLECTION
];

const DESCRIPTOR_TAIL: [u8; 19] = [
    0x05, 0x0d, // USAGE_PAGE (Digitizers)
    0x09, 0x54, // USAGE (Contact Count)
    0x95, 0x01, // REPORT_COUNT (1)
    0x75, 0x08, // REPORT_SIZE (8)
    0x15, 0x00, // LOGICAL_MINIMUM (0)
    0x25, 0x08, // LOGICAL_MAXIMUM (8)
    0x81, 0x02, // INPUT (Data,Var,Abs)
    0x09, 0x55, // USAGE (Contact Count Maximum)
    0xb1, 0x02, // FEATURE (Data,Var,Abs)
    0xc0, // END_COLLECTION
];

const LOGICAL_MAXIMUM_16: u8 = 0x26;

const FINGER_LEN: usize = COLLECTION_HEAD.len() + 3 + COLLECTION_X.len() + 3 + COLLECTION_TAIL.len();

/// Size of the report descriptor
pub const REPORT_DESCRIPTOR_LEN: usize =
    DESCRIPTOR_HEAD.len() + MAX_CONTACTS * FINGER_LEN + DESCRIPTOR_TAIL.len();

struct DescriptorWriter<'a> {
    buf: &'a mut [u8; REPORT_DESCRIPTOR_LEN],
    pos: usize,
}

impl DescriptorWriter<'_> {
    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }
}

/// Build the report descriptor for a screen of the given logical size
///
/// `max_x` and `max_y` are the little-endian byte pairs cached at boot and
/// land in the `LOGICAL_MAXIMUM` items of the X and Y usages.
pub fn report_descriptor(max_x: [u8; 2], max_y: [u8; 2]) -> [u8; REPORT_DESCRIPTOR_LEN] {
    let mut buf = [0u8; REPORT_DESCRIPTOR_LEN];
    let mut w = DescriptorWriter { buf: &mut buf, pos: 0 };

    w.put(&DESCRIPTOR_HEAD);
    for _ in 0..MAX_CONTACTS {
        w.put(&COLLECTION_HEAD);
        w.put(&[LOGICAL_MAXIMUM_16, max_x[0], max_x[1]]);
        w.put(&COLLECTION_X);
        w.put(&[LOGICAL_MAXIMUM_16, max_y[0], max_y[1]]);
        w.put(&COLLECTION_TAIL);
    }
    w.put(&DESCRIPTOR_TAIL);

    buf
}
