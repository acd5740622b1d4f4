//! Driver error types
//!
//! `E` is the [`RegisterIo`](mxt_hal::RegisterIo) error of the bus in use.

/// Errors reading the object table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError<E> {
    /// Information block announced more objects than the protocol allows
    ObjectCountOutOfRange(usize),
    /// Object table does not fit the rollup buffer
    TableTooLarge,
    /// Fewer bytes than the information block announced
    Truncated,
    /// Bus failure
    Io(E),
}

/// Errors from the device lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError<E> {
    /// A required object type is absent from the table
    MissingRequiredObject(u8),
    /// Operation needs a booted chip
    NotBooted,
    /// Object table could not be read
    Parse(ParseError<E>),
    /// Bus failure
    Io(E),
}

impl<E> From<ParseError<E>> for DeviceError<E> {
    fn from(e: ParseError<E>) -> Self {
        match e {
            ParseError::Io(e) => DeviceError::Io(e),
            other => DeviceError::Parse(other),
        }
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for ParseError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ObjectCountOutOfRange(n) => write!(f, "object count {} out of range", n),
            Self::TableTooLarge => write!(f, "object table too large"),
            Self::Truncated => write!(f, "object table truncated"),
            Self::Io(e) => write!(f, "bus error: {:?}", e),
        }
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for DeviceError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingRequiredObject(t) => write!(f, "required object T{} missing", t),
            Self::NotBooted => write!(f, "device not booted"),
            Self::Parse(e) => write!(f, "object table: {}", e),
            Self::Io(e) => write!(f, "bus error: {:?}", e),
        }
    }
}
