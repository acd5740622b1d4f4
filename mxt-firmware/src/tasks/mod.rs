//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels.

pub mod report;
pub mod touch;

pub use report::report_task;
pub use touch::{touch_task, TouchDevice};
