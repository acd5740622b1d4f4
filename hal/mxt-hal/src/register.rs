//! Register-addressed bus access
//!
//! The maXTouch exposes one linear 16-bit address space. Every object in the
//! object table is a window into it, so the whole core is written against
//! [`RegisterIo`] rather than a particular bus.

use crate::i2c::I2cBus;

/// Largest payload accepted by a single [`I2cRegisters::write`]
///
/// Writes issued by the core are a handful of bytes (soft reset, power
/// config, T9 control), so a small stack buffer is enough.
pub const MAX_WRITE_LEN: usize = 32;

/// Synchronous register access to the touch controller
///
/// Reads and writes never interleave with other traffic: one call is one
/// bus transaction.
pub trait RegisterIo {
    /// Error type for register operations
    type Error;

    /// Read `buf.len()` bytes starting at register `addr`
    fn read(&mut self, addr: u16, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `data` starting at register `addr`
    fn write(&mut self, addr: u16, data: &[u8]) -> Result<(), Self::Error>;

    /// Write a single byte
    fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), Self::Error> {
        self.write(addr, &[value])
    }
}

impl<T: RegisterIo + ?Sized> RegisterIo for &mut T {
    type Error = T::Error;

    fn read(&mut self, addr: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(addr, buf)
    }

    fn write(&mut self, addr: u16, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write(addr, data)
    }
}

/// Errors from [`I2cRegisters`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterError<E> {
    /// Underlying bus failure
    Bus(E),
    /// Payload exceeds [`MAX_WRITE_LEN`]
    WriteTooLong,
}

/// [`RegisterIo`] over an I2C bus
///
/// The register pointer is sent low byte first, which is the order the
/// mXT object protocol uses on the wire.
pub struct I2cRegisters<B> {
    bus: B,
    address: u8,
}

impl<B: I2cBus> I2cRegisters<B> {
    /// Wrap a bus for the device at the given 7-bit address
    pub fn new(bus: B, address: u8) -> Self {
        Self { bus, address }
    }

    /// Device address on the bus
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }
}

impl<B: I2cBus> RegisterIo for I2cRegisters<B> {
    type Error = RegisterError<B::Error>;

    fn read(&mut self, addr: u16, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.bus
            .write_read(self.address, &addr.to_le_bytes(), buf)
            .map_err(RegisterError::Bus)
    }

    fn write(&mut self, addr: u16, data: &[u8]) -> Result<(), Self::Error> {
        if data.len() > MAX_WRITE_LEN {
            return Err(RegisterError::WriteTooLong);
        }

        let mut frame = [0u8; MAX_WRITE_LEN + 2];
        frame[..2].copy_from_slice(&addr.to_le_bytes());
        frame[2..2 + data.len()].copy_from_slice(data);

        self.bus
            .write(self.address, &frame[..2 + data.len()])
            .map_err(RegisterError::Bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bus that records the last write and answers reads with a fixed byte
    struct RecordingBus {
        last_address: u8,
        last_write: [u8; MAX_WRITE_LEN + 2],
        last_write_len: usize,
        fill: u8,
    }

    impl RecordingBus {
        fn new(fill: u8) -> Self {
            Self {
                last_address: 0,
                last_write: [0; MAX_WRITE_LEN + 2],
                last_write_len: 0,
                fill,
            }
        }
    }

    impl I2cBus for RecordingBus {
        type Error = ();

        fn write(&mut self, address: u8, data: &[u8]) -> Result<(), ()> {
            self.last_address = address;
            self.last_write[..data.len()].copy_from_slice(data);
            self.last_write_len = data.len();
            Ok(())
        }

        fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), ()> {
            self.last_address = address;
            buf.fill(self.fill);
            Ok(())
        }

        fn write_read(&mut self, address: u8, write: &[u8], read: &mut [u8]) -> Result<(), ()> {
            self.write(address, write)?;
            self.read(address, read)
        }
    }

    #[test]
    fn test_write_prefixes_little_endian_register() {
        let mut regs = I2cRegisters::new(RecordingBus::new(0), 0x4A);
        regs.write(0x0123, &[0xAA, 0xBB]).unwrap();

        let bus = regs.release();
        assert_eq!(bus.last_address, 0x4A);
        assert_eq!(&bus.last_write[..bus.last_write_len], &[0x23, 0x01, 0xAA, 0xBB]);
    }

    #[test]
    fn test_read_sends_pointer_then_fills() {
        let mut regs = I2cRegisters::new(RecordingBus::new(0x5A), 0x4B);
        let mut buf = [0u8; 4];
        regs.read(0x0200, &mut buf).unwrap();

        assert_eq!(buf, [0x5A; 4]);
        let bus = regs.release();
        assert_eq!(&bus.last_write[..bus.last_write_len], &[0x00, 0x02]);
    }

    #[test]
    fn test_oversized_write_rejected() {
        let mut regs = I2cRegisters::new(RecordingBus::new(0), 0x4A);
        let data = [0u8; MAX_WRITE_LEN + 1];
        assert_eq!(regs.write(0, &data), Err(RegisterError::WriteTooLong));
    }

    #[test]
    fn test_write_byte_default() {
        let mut regs = I2cRegisters::new(RecordingBus::new(0), 0x4A);
        regs.write_byte(0x0010, 1).unwrap();
        let bus = regs.release();
        assert_eq!(&bus.last_write[..bus.last_write_len], &[0x10, 0x00, 0x01]);
    }
}
