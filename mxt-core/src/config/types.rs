//! Configuration type definitions

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default 7-bit I2C address of the controller
pub const DEFAULT_I2C_ADDRESS: u8 = 0x4A;

/// Tunables of the touch driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DriverConfig {
    /// 7-bit I2C address
    pub i2c_address: u8,
    /// Bus clock in Hz
    pub i2c_frequency_hz: u32,
    /// Delay between soft reset and boot completion (ms)
    pub boot_delay_ms: u32,
    /// Poll tick period (ms)
    pub poll_interval_ms: u32,
    /// T7 idle acquisition interval written on resume
    pub t7_idle: u8,
    /// T7 active acquisition interval written on resume
    pub t7_active: u8,
    /// T9 CTRL value written on resume
    pub t9_ctrl_run: u8,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            i2c_address: DEFAULT_I2C_ADDRESS,
            i2c_frequency_hz: 400_000,
            boot_delay_ms: 200,
            poll_interval_ms: 10,
            t7_idle: 100,
            t7_active: 20,
            t9_ctrl_run: mxt_protocol::message::t9::CTRL_RUN,
        }
    }
}

impl DriverConfig {
    /// T7 bytes written when the chip is brought up
    pub fn t7_run(&self) -> [u8; 2] {
        [self.t7_idle, self.t7_active]
    }
}

/// T7 bytes that put the chip into deep sleep
pub const T7_DEEP_SLEEP: [u8; 2] = [0, 0];
