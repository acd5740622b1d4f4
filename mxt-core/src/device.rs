//! Device context
//!
//! [`Device`] owns the bus and every piece of driver state. All entry points
//! take `&mut self`, so interrupt service, poll ticks, power transitions and
//! host feature requests are serialized by whoever owns the device.
//!
//! Lifecycle:
//!
//! ```text
//! prepare_hardware ─► d0_entry ─► { on_interrupt | on_tick }* ─► d0_exit
//!        │                ▲                                        │
//!        │                └────────────────────────────────────────┘
//!        └──────────────────────────────────────────► release_hardware
//! ```

use mxt_hal::RegisterIo;
use mxt_protocol::hid::{
    report_descriptor, DeviceAttributes, FeatureError, FeatureReport, TouchReport,
    DEVICE_ATTRIBUTES, REPORT_DESCRIPTOR_LEN, REPORT_ID_FEATURE, REPORT_ID_TOUCH,
};

use crate::boot::{BootSequencer, BootState, BootToken};
use crate::config::DriverConfig;
use crate::contact::{ContactTracker, RenderOptions, ReportBuilder};
use crate::error::DeviceError;
use crate::object::ChipProfile;
use crate::pump::{MessagePump, ReadStrategy};

/// Receives finished touch reports
pub trait ReportSink {
    /// Called at most once per interrupt or tick, never with an empty report
    fn deliver(&mut self, report: &TouchReport);
}

impl<F: FnMut(&TouchReport)> ReportSink for F {
    fn deliver(&mut self, report: &TouchReport) {
        self(report)
    }
}

/// Touch controller driver state
pub struct Device<IO> {
    io: IO,
    boot: BootSequencer,
    pump: Option<MessagePump>,
    contacts: ContactTracker,
    connected: bool,
    regs_set: bool,
}

impl<IO: RegisterIo> Device<IO> {
    /// Wrap a register interface; nothing is read until
    /// [`prepare_hardware`](Self::prepare_hardware)
    pub fn new(io: IO, config: DriverConfig) -> Self {
        Self {
            io,
            boot: BootSequencer::new(config),
            pump: None,
            contacts: ContactTracker::new(),
            connected: false,
            regs_set: false,
        }
    }

    /// Read the object table and start the first boot
    pub fn prepare_hardware(&mut self) -> Result<Option<BootToken>, DeviceError<IO::Error>> {
        self.boot.boot(&mut self.io, &mut self.pump, &mut self.contacts)
    }

    /// Redeem a boot continuation; stale tokens are ignored
    pub fn complete_boot(&mut self, token: BootToken) -> bool {
        self.boot.complete(&mut self.io, token)
    }

    /// Power on: bring the chip up, forget all contacts and accept input
    ///
    /// Boots from scratch if the first boot never succeeded.
    pub fn d0_entry(&mut self) -> Result<Option<BootToken>, DeviceError<IO::Error>> {
        let token = self
            .boot
            .boot(&mut self.io, &mut self.pump, &mut self.contacts)?;

        self.contacts.clear();
        self.regs_set = false;
        self.connected = true;
        Ok(token)
    }

    /// Power off: stop accepting input and put the chip to sleep
    pub fn d0_exit(&mut self) -> Result<(), DeviceError<IO::Error>> {
        self.connected = false;
        self.boot.power_down(&mut self.io)
    }

    /// Drop the object table and profile; pending boot tokens become stale
    pub fn release_hardware(&mut self) {
        self.connected = false;
        self.regs_set = false;
        self.pump = None;
        self.boot.release();
    }

    /// Service the CHG interrupt
    ///
    /// Reads pending messages, updates the contacts and delivers one report
    /// if any contact is active. Returns the number of valid messages.
    pub fn on_interrupt<S: ReportSink>(&mut self, sink: &mut S) -> Result<usize, DeviceError<IO::Error>> {
        if !self.connected {
            return Ok(0);
        }
        let (Some(profile), Some(pump)) = (self.boot.profile(), self.pump.as_mut()) else {
            return Err(DeviceError::NotBooted);
        };

        let valid = pump
            .pump(&mut self.io, profile, &mut self.contacts)
            .map_err(DeviceError::Io)?;
        self.regs_set = true;

        let options = RenderOptions {
            in_range: pump.strategy() == ReadStrategy::CountPrefixed,
        };
        self.render_and_deliver(options, sink);
        Ok(valid)
    }

    /// Periodic tick: re-render the current contacts
    ///
    /// Does nothing until an interrupt has read the chip at least once
    /// since power-on. Returns whether a report was delivered.
    pub fn on_tick<S: ReportSink>(&mut self, sink: &mut S) -> bool {
        if !self.connected || !self.regs_set {
            return false;
        }
        self.render_and_deliver(RenderOptions::default(), sink)
    }

    fn render_and_deliver<S: ReportSink>(&mut self, options: RenderOptions, sink: &mut S) -> bool {
        let report = ReportBuilder::new(options).render(&mut self.contacts);
        if report.is_empty() {
            return false;
        }
        sink.deliver(&report);
        true
    }

    /// Answer a host get-feature request
    pub fn get_feature(&self, report_id: u8) -> Result<FeatureReport, FeatureError> {
        match report_id {
            REPORT_ID_TOUCH => Ok(FeatureReport::MAX_COUNT),
            REPORT_ID_FEATURE => Ok(FeatureReport::Mode {
                mode: self.boot.device_mode(),
                identifier: 0,
            }),
            other => Err(FeatureError::UnknownReport(other)),
        }
    }

    /// Apply a host set-feature request
    ///
    /// Only the device mode report is writable.
    pub fn set_feature(&mut self, bytes: &[u8]) -> Result<(), FeatureError> {
        match FeatureReport::decode(bytes)? {
            FeatureReport::Mode { mode, .. } => {
                self.boot.set_device_mode(mode);
                Ok(())
            }
            other => Err(FeatureError::UnknownReport(other.report_id())),
        }
    }

    /// HID report descriptor sized for the booted screen
    pub fn report_descriptor(&self) -> [u8; REPORT_DESCRIPTOR_LEN] {
        let (x, y) = self
            .boot
            .profile()
            .map(|p| (p.max_x_hid(), p.max_y_hid()))
            .unwrap_or_default();
        report_descriptor(x, y)
    }

    /// HID vendor, product and version
    pub fn attributes(&self) -> DeviceAttributes {
        DEVICE_ATTRIBUTES
    }

    pub fn profile(&self) -> Option<&ChipProfile> {
        self.boot.profile()
    }

    pub fn boot_state(&self) -> BootState {
        self.boot.state()
    }

    pub fn config(&self) -> &DriverConfig {
        self.boot.config()
    }

    pub fn contacts(&self) -> &ContactTracker {
        &self.contacts
    }

    /// Input is being processed
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Valid messages seen by the last drain-mode interrupt
    pub fn last_message_count(&self) -> usize {
        self.pump.as_ref().map_or(0, MessagePump::last_message_count)
    }

    /// Give the register interface back
    pub fn release(self) -> IO {
        self.io
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimChip, SimError, TableBuilder};
    use mxt_protocol::hid::{DeviceMode, STATUS_CONFIDENCE, STATUS_IN_RANGE, STATUS_TIP};
    use mxt_protocol::message::{t100, t6, t9};
    use mxt_protocol::object::object_type;

    const T5: u16 = 0x0100;
    const T6: u16 = 0x0110;
    const T7: u16 = 0x0120;
    const T9: u16 = 0x0200;
    const T44: u16 = 0x00FF;
    const T100: u16 = 0x0300;

    fn t100_device() -> Device<SimChip> {
        let table = TableBuilder::new()
            .object(object_type::GEN_MESSAGE_T5, T5, 10, 1, 0)
            .object(object_type::GEN_COMMAND_T6, T6, 6, 1, 1)
            .object(object_type::GEN_POWER_T7, T7, 4, 1, 0)
            .object(object_type::SPT_MESSAGECOUNT_T44, T44, 1, 1, 0)
            .object(object_type::TOUCH_MULTITOUCHSCREEN_T100, T100, 60, 1, 12)
            .build();
        let mut sim = SimChip::new();
        sim.load_table(&table);
        sim.set_regs(T100 + t100::XRANGE, &1023u16.to_le_bytes());
        sim.set_regs(T100 + t100::YRANGE, &767u16.to_le_bytes());
        Device::new(sim, DriverConfig::default())
    }

    fn t9_device() -> Device<SimChip> {
        let table = TableBuilder::new()
            .object(object_type::GEN_MESSAGE_T5, T5, 10, 1, 0)
            .object(object_type::GEN_COMMAND_T6, T6, 6, 1, 1)
            .object(object_type::TOUCH_MULTI_T9, T9, 35, 1, 10)
            .build();
        let mut sim = SimChip::new();
        sim.load_table(&table);
        sim.set_regs(T9 + t9::RANGE, &[0xFF, 0x0F, 0xFF, 0x0F]);
        Device::new(sim, DriverConfig::default())
    }

    fn powered(mut device: Device<SimChip>) -> Device<SimChip> {
        let token = device.prepare_hardware().unwrap().unwrap();
        device.d0_entry().unwrap();
        assert!(device.complete_boot(token));
        device
    }

    fn sim(device: &mut Device<SimChip>) -> &mut SimChip {
        &mut device.io
    }

    #[test]
    fn test_end_to_end_t100() {
        let mut device = powered(t100_device());
        assert_eq!(device.boot_state(), BootState::Booted);

        // T100 ids are 2..=13; id 4 is the first contact slot
        sim(&mut device).push_message(&[4, 0x80, 100, 0, 200, 0]);

        let mut reports = Vec::new();
        let valid = device
            .on_interrupt(&mut |r: &TouchReport| reports.push(r.clone()))
            .unwrap();
        assert_eq!(valid, 1);
        assert_eq!(reports.len(), 1);

        let report = &reports[0];
        assert_eq!(report.actual_count(), 1);
        let contact = report.contacts()[0];
        assert_eq!(contact.contact_id, 0);
        assert_eq!((contact.x, contact.y), (100, 200));
        assert_eq!(contact.status, STATUS_TIP | STATUS_CONFIDENCE | STATUS_IN_RANGE);
        assert_eq!(contact.width, 10);

        let bytes = report.encode();
        assert_eq!(&bytes[..7], &[1, 0x07, 0, 100, 0, 200, 0]);
        assert_eq!(bytes[101], 1);
    }

    #[test]
    fn test_t100_release_reported_once() {
        let mut device = powered(t100_device());
        let mut reports = Vec::new();
        let mut sink = |r: &TouchReport| reports.push(r.clone());

        sim(&mut device).push_message(&[4, 0x80, 10, 0, 10, 0]);
        device.on_interrupt(&mut sink).unwrap();
        sim(&mut device).push_message(&[4, 0x00, 10, 0, 10, 0]);
        device.on_interrupt(&mut sink).unwrap();

        // Release tick: nothing left to report
        assert!(!device.on_tick(&mut sink));
        assert!(!device.contacts().slot(0).is_active());

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].contacts()[0].status, 0);
    }

    #[test]
    fn test_tick_before_first_read_is_noop() {
        let mut device = powered(t100_device());
        let mut calls = 0;
        assert!(!device.on_tick(&mut |_: &TouchReport| calls += 1));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_tick_rerenders_without_in_range() {
        let mut device = powered(t100_device());
        sim(&mut device).push_message(&[5, 0x80, 1, 0, 2, 0]);

        let mut reports = Vec::new();
        device
            .on_interrupt(&mut |r: &TouchReport| reports.push(r.clone()))
            .unwrap();
        assert!(device.on_tick(&mut |r: &TouchReport| reports.push(r.clone())));

        assert_eq!(reports[1].contacts()[0].status, STATUS_TIP | STATUS_CONFIDENCE);
        assert_eq!(reports[1].contacts()[0].contact_id, 1);
    }

    #[test]
    fn test_t9_drain_without_in_range() {
        let mut device = powered(t9_device());
        // 12-bit range; id 2 is T9 slot 2 (T6 owns id 1)
        sim(&mut device).push_message(&[2, 0xC0, 0x64, 0xC8, 0x00, 4]);

        let mut reports = Vec::new();
        device
            .on_interrupt(&mut |r: &TouchReport| reports.push(r.clone()))
            .unwrap();

        let contact = reports[0].contacts()[0];
        assert_eq!(contact.contact_id, 2);
        assert_eq!((contact.x, contact.y), (0x640, 0xC80));
        assert_eq!(contact.status, STATUS_TIP | STATUS_CONFIDENCE);
        assert_eq!(device.last_message_count(), 1);
    }

    #[test]
    fn test_no_report_without_contacts() {
        let mut device = powered(t100_device());
        // Status message only
        sim(&mut device).push_message(&[1, t6::STATUS_RESET, 0, 0, 0]);

        let mut calls = 0;
        let valid = device.on_interrupt(&mut |_: &TouchReport| calls += 1).unwrap();
        assert_eq!(valid, 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_interrupt_ignored_when_powered_down() {
        let mut device = powered(t100_device());
        device.d0_exit().unwrap();
        assert_eq!(sim(&mut device).writes_to(T7).last(), Some(&vec![0, 0]));

        sim(&mut device).push_message(&[4, 0x80, 1, 0, 1, 0]);
        let mut calls = 0;
        assert_eq!(device.on_interrupt(&mut |_: &TouchReport| calls += 1), Ok(0));
        assert_eq!(calls, 0);
        assert_eq!(sim(&mut device).pending(), 1);
    }

    #[test]
    fn test_d0_entry_resumes_and_clears_contacts() {
        let mut device = powered(t100_device());
        sim(&mut device).push_message(&[4, 0x80, 1, 0, 1, 0]);
        device.on_interrupt(&mut |_: &TouchReport| {}).unwrap();
        assert_eq!(device.contacts().active_count(), 1);

        device.d0_exit().unwrap();
        sim(&mut device).clear_log();
        assert_eq!(device.d0_entry(), Ok(None));

        assert_eq!(device.contacts().active_count(), 0);
        assert_eq!(sim(&mut device).writes_to(T7), vec![vec![100, 20]]);
        assert_eq!(sim(&mut device).writes_to(T6), vec![vec![1]]);
        assert!(!device.on_tick(&mut |_: &TouchReport| {}));
    }

    #[test]
    fn test_release_makes_boot_token_stale() {
        let mut device = t100_device();
        let token = device.prepare_hardware().unwrap().unwrap();
        device.release_hardware();

        assert!(!device.complete_boot(token));
        assert_eq!(device.boot_state(), BootState::Unbooted);
        assert!(device.profile().is_none());
        assert_eq!(device.last_message_count(), 0);
    }

    #[test]
    fn test_interrupt_io_error() {
        let mut device = powered(t100_device());
        sim(&mut device).fail_io(true);
        assert_eq!(
            device.on_interrupt(&mut |_: &TouchReport| {}),
            Err(DeviceError::Io(SimError))
        );
    }

    #[test]
    fn test_feature_reports() {
        let mut device = t100_device();
        assert_eq!(device.get_feature(1), Ok(FeatureReport::MAX_COUNT));
        assert_eq!(
            device.get_feature(2),
            Ok(FeatureReport::Mode {
                mode: DeviceMode::Mouse,
                identifier: 0
            })
        );
        assert_eq!(device.get_feature(3), Err(FeatureError::UnknownReport(3)));

        device.set_feature(&[2, 2, 0]).unwrap();
        assert_eq!(
            device.get_feature(2),
            Ok(FeatureReport::Mode {
                mode: DeviceMode::MultiInput,
                identifier: 0
            })
        );
        assert_eq!(device.set_feature(&[1, 5]), Err(FeatureError::UnknownReport(1)));
    }

    #[test]
    fn test_descriptor_uses_screen_size() {
        let device = powered(t100_device());
        let desc = device.report_descriptor();
        // 1024 x 768
        let x_at = 10 + 43;
        assert_eq!(&desc[x_at..x_at + 3], &[0x26, 0x00, 0x04]);
        let y_at = x_at + 3 + 4;
        assert_eq!(&desc[y_at..y_at + 3], &[0x26, 0x00, 0x03]);
        assert_eq!(device.attributes().product_id, 0xBACC);
    }
}
