//! Report task
//!
//! Drains the report channel and hands each report to the host link. Only
//! the encoded bytes are logged for now.

use defmt::*;

use crate::channels::REPORT_CHANNEL;

#[embassy_executor::task]
pub async fn report_task() {
    info!("Report task started");

    loop {
        let report = REPORT_CHANNEL.receive().await;
        let bytes = report.encode();
        debug!(
            "Touch report, {} contacts: {=[u8]:x}",
            report.actual_count(),
            &bytes[..]
        );
    }
}
