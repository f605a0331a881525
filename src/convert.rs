//! Geodetic and temporal conversions shared by both sources.

/// Seconds between the Garmin epoch (1989-12-31T00:00:00Z) and the Unix
/// epoch.
pub const GARMIN_EPOCH_OFFSET: i64 = 631_065_600;

/// Convert a 32-bit signed semicircle angle to degrees.
///
/// The full circle (±180°) maps to ±2³¹, so the scale is exact for the
/// extremes.
pub fn semicircles_to_degrees(v: i32) -> f64 {
    v as f64 * (180.0 / 2_147_483_648.0)
}

/// Convert a timestamp counted from the Garmin epoch to Unix seconds.
pub fn garmin_epoch_to_unix(t: u32) -> i64 {
    t as i64 + GARMIN_EPOCH_OFFSET
}

/// Shift a stored UTC timestamp for human-readable display.
///
/// Stored timestamps remain UTC; this is applied only when rendering.
pub fn apply_tz_offset(unix_ts: i64, offset_seconds: i64) -> i64 {
    unix_ts + offset_seconds
}
