//! Time helpers
//!
//! Media positions are plain `f64` seconds (as reported by players);
//! timers and cadences use `std::time::Duration`.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Seconds as a duration; negative and non-finite values map to `None`
pub fn secs_to_duration(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

/// Normalize a player-reported position: NaN, infinities and the `-1`
/// "unavailable" marker become `None`
pub fn known_position(secs: f64) -> Option<f64> {
    if secs.is_finite() && secs >= 0.0 {
        Some(secs)
    } else {
        None
    }
}
