//! Small time utilities shared across the crate.

use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

/// Returns a monotonic timestamp in nanoseconds since an arbitrary process
/// epoch (the first call to this function).
///
/// Unlike [`current_time_millis`], this clock never goes backwards, which
/// makes it suitable for time-priority ordering and latency measurement.
pub fn monotonic_time_ns() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_nanos() as u64
}
