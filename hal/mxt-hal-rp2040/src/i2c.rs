//! I2C master for the touch controller
//!
//! The driver core is synchronous, so the blocking flavour of the embassy
//! peripheral is used. Register transfers are short (a few dozen bytes at
//! 400 kHz) and run from a single task.

use embassy_rp::i2c::{AbortReason, Blocking, Config, Error as I2cError, I2c, Instance};
use mxt_hal::{I2cBus, I2cConfig};

/// Error from I2C operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cBusError {
    /// Device did not acknowledge
    Nack,
    /// Arbitration lost
    ArbitrationLost,
    /// Transfer aborted for another reason
    Abort,
    /// Buffer length not supported by the peripheral
    BufferLength,
    /// Address outside the 7-bit range or reserved
    Address,
    /// Other error
    Other,
}

impl From<I2cError> for I2cBusError {
    fn from(e: I2cError) -> Self {
        match e {
            I2cError::Abort(AbortReason::NoAcknowledge) => I2cBusError::Nack,
            I2cError::Abort(AbortReason::ArbitrationLoss) => I2cBusError::ArbitrationLost,
            I2cError::Abort(_) => I2cBusError::Abort,
            I2cError::InvalidReadBufferLength | I2cError::InvalidWriteBufferLength => {
                I2cBusError::BufferLength
            }
            I2cError::AddressOutOfRange(_) | I2cError::AddressReserved(_) => I2cBusError::Address,
            #[allow(unreachable_patterns)]
            _ => I2cBusError::Other,
        }
    }
}

/// Peripheral configuration for the given bus settings
pub fn peripheral_config(config: I2cConfig) -> Config {
    let mut c = Config::default();
    c.frequency = config.frequency;
    c
}

/// Blocking RP2040 I2C master
pub struct Rp2040I2c<'d, T: Instance> {
    i2c: I2c<'d, T, Blocking>,
}

impl<'d, T: Instance> Rp2040I2c<'d, T> {
    /// Wrap an already configured peripheral
    pub fn new(i2c: I2c<'d, T, Blocking>) -> Self {
        Self { i2c }
    }

    /// Give the peripheral back
    pub fn into_inner(self) -> I2c<'d, T, Blocking> {
        self.i2c
    }
}

impl<T: Instance> I2cBus for Rp2040I2c<'_, T> {
    type Error = I2cBusError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.i2c.blocking_write(address, data).map_err(I2cBusError::from)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.blocking_read(address, buf).map_err(I2cBusError::from)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.i2c
            .blocking_write_read(address, write_data, read_buf)
            .map_err(I2cBusError::from)
    }
}
