//! Wall-clock helpers.
//!
//! All persisted timestamps are milliseconds since the Unix epoch. Scheduler
//! operations take `now_ms` explicitly so tests can drive time; this helper
//! is for callers living in real time (watchers, benchmarks).

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
