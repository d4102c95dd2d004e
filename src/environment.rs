//! Host environment callbacks
//!
//! Facts the engine asks the host for while a script runs. The callbacks
//! are plain functions: they see no handle state and take no locks, so
//! calling them from inside `evaluate` can never deadlock.
//!
//! The callbacks always read the host's own time zone database. They are
//! not pluggable, since the engine's built-in local-time accessors read
//! the same database and the two must agree.

use chrono::{Local, Offset, TimeZone};

/// Callbacks registered with an engine context at creation
#[derive(Debug, Clone, Copy, Default)]
pub struct HostEnvironment {
    _private: (),
}

impl HostEnvironment {
    /// Offset of local time from UTC, in seconds, at the given instant
    pub fn local_time_zone_offset_seconds(&self, epoch_millis: f64) -> i32 {
        local_time_zone_offset_seconds(epoch_millis)
    }
}

/// Offset in seconds between local time and UTC at `epoch_millis`
///
/// Follows the host time zone database, including daylight saving rules
/// in effect at that instant.
pub fn local_time_zone_offset_seconds(epoch_millis: f64) -> i32 {
    offset_seconds_at(&Local, epoch_millis)
}

/// Offset in seconds between `tz` and UTC at `epoch_millis`
///
/// Instants that are not finite or fall outside the representable range
/// resolve to 0.
pub fn offset_seconds_at<Tz: TimeZone>(tz: &Tz, epoch_millis: f64) -> i32 {
    if !epoch_millis.is_finite() {
        return 0;
    }
    let millis = epoch_millis.trunc();
    if millis < i64::MIN as f64 || millis > i64::MAX as f64 {
        return 0;
    }
    match tz.timestamp_millis_opt(millis as i64).single() {
        Some(at) => at.offset().fix().local_minus_utc(),
        None => 0,
    }
}
