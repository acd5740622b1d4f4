//! Touch controller task
//!
//! Owns the device and multiplexes its three event sources:
//!
//! - CHG low: the chip has messages pending
//! - Poll ticker: re-render held contacts
//! - Boot timer: the soft reset issued during bring-up has settled

use core::future::pending;

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_rp::gpio::Input;
use embassy_rp::peripherals::I2C0;
use embassy_time::{Duration, Instant, Ticker, Timer};

use mxt_core::{BootToken, Device, ReportSink};
use mxt_hal::I2cRegisters;
use mxt_hal_rp2040::Rp2040I2c;
use mxt_protocol::TouchReport;

use crate::channels::REPORT_CHANNEL;

/// Device type on this board
pub type TouchDevice = Device<I2cRegisters<Rp2040I2c<'static, I2C0>>>;

/// Back-off after a failed bring-up or message read
const RETRY_DELAY_MS: u64 = 1000;

/// Forwards reports to the report task
struct ChannelSink;

impl ReportSink for ChannelSink {
    fn deliver(&mut self, report: &TouchReport) {
        if REPORT_CHANNEL.try_send(report.clone()).is_err() {
            warn!("Report channel full, dropping report");
        }
    }
}

#[embassy_executor::task]
pub async fn touch_task(device: &'static mut TouchDevice, mut chg: Input<'static>) {
    info!("Touch task started");

    let mut boot = bring_up(device).await;
    let mut ticker = Ticker::every(Duration::from_millis(device.config().poll_interval_ms as u64));
    let mut sink = ChannelSink;

    loop {
        let connected = device.is_connected();
        let deadline = boot.map(|(at, _)| at);

        match select3(wait_chg(&mut chg, connected), ticker.next(), wait_until(deadline)).await {
            Either3::First(()) => {
                if let Err(e) = device.on_interrupt(&mut sink) {
                    warn!("Message read failed: {}", e);
                    Timer::after_millis(RETRY_DELAY_MS).await;
                }
            }
            Either3::Second(()) => {
                device.on_tick(&mut sink);
            }
            Either3::Third(()) => {
                if let Some((_, token)) = boot.take() {
                    if device.complete_boot(token) {
                        info!("Touch controller ready");
                    }
                }
            }
        }
    }
}

/// Read the object table and power the chip on, retrying until it answers
async fn bring_up(device: &mut TouchDevice) -> Option<(Instant, BootToken)> {
    loop {
        let token = match device.prepare_hardware() {
            Ok(token) => token,
            Err(e) => {
                error!("Touch controller init failed: {}", e);
                Timer::after_millis(RETRY_DELAY_MS).await;
                continue;
            }
        };

        match device.d0_entry() {
            Ok(_) => {
                if let Some(profile) = device.profile() {
                    info!(
                        "Touch controller: {} touch ids, screen {}x{}",
                        profile.num_touch_ids, profile.max_x, profile.max_y
                    );
                }
                return token.map(|t| {
                    let at = Instant::now() + Duration::from_millis(t.delay_ms() as u64);
                    (at, t)
                });
            }
            Err(e) => {
                error!("Touch controller power-on failed: {}", e);
                device.release_hardware();
                Timer::after_millis(RETRY_DELAY_MS).await;
            }
        }
    }
}

/// CHG is level triggered: the chip holds it low until its queue is empty
async fn wait_chg(chg: &mut Input<'static>, connected: bool) {
    if connected {
        chg.wait_for_low().await
    } else {
        pending().await
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => Timer::at(at).await,
        None => pending().await,
    }
}
