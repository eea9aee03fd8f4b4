//! Disk capacity monitoring for the upload directory.

mod monitor;

pub use monitor::{DiskMonitor, DiskStatus};
