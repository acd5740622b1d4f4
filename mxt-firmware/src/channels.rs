//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use mxt_protocol::TouchReport;

/// Channel capacity for touch reports
const REPORT_CHANNEL_SIZE: usize = 4;

/// Finished touch reports, produced by the touch task
pub static REPORT_CHANNEL: Channel<CriticalSectionRawMutex, TouchReport, REPORT_CHANNEL_SIZE> =
    Channel::new();
