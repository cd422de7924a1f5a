//! Constants for the download module (timeouts, page naming, progress).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large pages).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Width that page numbers are zero-padded to in file names.
pub const PAGE_NUMBER_WIDTH: usize = 5;

/// How often the reporter samples the progress counters.
pub const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// File name of the per-item manifest.
pub const MANIFEST_FILE_NAME: &str = "item.json";
