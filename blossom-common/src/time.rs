//! Timestamp utilities

use chrono::{DateTime, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert an external `created_utc` value (fractional Unix seconds) to a UTC timestamp.
///
/// Returns `None` for a missing or out-of-range value; callers store that as a
/// null timestamp rather than failing.
pub fn from_unix_seconds(created_utc: Option<f64>) -> Option<DateTime<Utc>> {
    let secs = created_utc?;
    if !secs.is_finite() {
        return None;
    }
    if secs.abs() >= i64::MAX as f64 {
        return None;
    }
    // Floor keeps the fraction non-negative for pre-epoch values
    let mut whole = secs.floor() as i64;
    let mut nanos = (secs.rem_euclid(1.0) * 1_000_000_000.0).round() as u32;
    if nanos >= 1_000_000_000 {
        whole = whole.checked_add(1)?;
        nanos = 0;
    }
    Utc.timestamp_opt(whole, nanos).single()
}
