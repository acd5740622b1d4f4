//! maXTouch touchscreen firmware
//!
//! Brings up an Atmel maXTouch controller on I2C0, services its CHG line
//! and turns contact messages into HID multitouch reports.
//!
//! Board wiring (RP2040):
//! - GPIO4: SDA
//! - GPIO5: SCL
//! - GPIO6: CHG (open drain, active low)

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::i2c::I2c;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use mxt_core::config::{parse_config, DriverConfig};
use mxt_core::Device;
use mxt_hal::{I2cConfig, I2cRegisters};
use mxt_hal_rp2040::i2c::peripheral_config;
use mxt_hal_rp2040::Rp2040I2c;

use crate::tasks::TouchDevice;

/// Embedded configuration (compiled into firmware)
/// Edit touch.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../touch.toml");

mod channels;
mod tasks;

// The device holds the object table and the message buffer, too large to
// move into a task by value
static DEVICE: StaticCell<TouchDevice> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("maXTouch firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    let bus_config = peripheral_config(I2cConfig {
        frequency: config.i2c_frequency_hz,
    });
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, bus_config);
    let regs = I2cRegisters::new(Rp2040I2c::new(i2c), config.i2c_address);
    info!("I2C initialized at {} Hz", config.i2c_frequency_hz);

    let chg = Input::new(p.PIN_6, Pull::Up);

    let device = DEVICE.init(Device::new(regs, config));

    spawner.spawn(tasks::report_task()).unwrap();
    spawner.spawn(tasks::touch_task(device, chg)).unwrap();

    info!("All tasks spawned, firmware running");
}

/// Parse the embedded configuration, falling back to defaults
fn load_config() -> DriverConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Touch config: addr={=u8:#x}, boot delay={}ms, poll={}ms",
                config.i2c_address, config.boot_delay_ms, config.poll_interval_ms
            );
            config
        }
        Err(e) => {
            warn!("Invalid touch.toml ({}), using defaults", e);
            DriverConfig::default()
        }
    }
}
