//! Normalized, unit-aware records produced by both sources.
//!
//! All magnitudes are SI (meters, meters per second, seconds, degrees
//! Celsius) and all timestamps are Unix seconds UTC. A field the source did
//! not record is `None`, never a reserved magnitude or a spurious zero.

/// One point-in-time measurement, in source order.
///
/// Ordering is strictly the order received from the source; timestamps are
/// not re-sorted and are not guaranteed monotonic.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    /// Unix seconds. Always present; partial samples are never emitted.
    pub timestamp: i64,
    /// Degrees, signed.
    pub latitude: Option<f64>,
    /// Degrees, signed.
    pub longitude: Option<f64>,
    /// Meters per second.
    pub speed: Option<f64>,
    /// Meters, cumulative from activity start.
    pub distance: Option<f64>,
    /// Meters.
    pub altitude: Option<f64>,
    /// Steps per minute.
    pub cadence: Option<f64>,
    /// Beats per minute.
    pub heart_rate: Option<f64>,
}

/// A device- or user-marked sub-interval of the activity.
///
/// The tree source carries no end position, calories, or timer time per
/// lap; those fields stay absent on that path.
#[derive(Debug, Clone, PartialEq)]
pub struct LapRecord {
    /// End-of-lap Unix seconds.
    pub timestamp: i64,
    pub start_lat: Option<f64>,
    pub start_lng: Option<f64>,
    pub end_lat: Option<f64>,
    pub end_lng: Option<f64>,
    /// Meters.
    pub total_distance: Option<f64>,
    /// Kilocalories.
    pub total_calories: Option<f64>,
    /// Seconds.
    pub total_elapsed_time: Option<f64>,
    /// Seconds, binary source only.
    pub total_timer_time: Option<f64>,
}

/// The whole-activity aggregate record, one per file.
///
/// Every numeric field is independently present or absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    /// Unix seconds at activity start.
    pub start_time: Option<i64>,
    /// Unix seconds at activity end.
    pub end_time: Option<i64>,
    pub start_position_lat: Option<f64>,
    pub start_position_long: Option<f64>,
    /// Seconds.
    pub total_elapsed_time: Option<f64>,
    /// Seconds.
    pub total_timer_time: Option<f64>,
    /// Meters.
    pub total_distance: Option<f64>,
    /// Bounding box, north-east corner.
    pub nec_lat: Option<f64>,
    pub nec_long: Option<f64>,
    /// Bounding box, south-west corner.
    pub swc_lat: Option<f64>,
    pub swc_long: Option<f64>,
    /// Joules.
    pub total_work: Option<f64>,
    /// Seconds.
    pub total_moving_time: Option<f64>,
    /// Seconds.
    pub avg_lap_time: Option<f64>,
    /// Kilocalories.
    pub total_calories: Option<f64>,
    /// Meters per second.
    pub avg_speed: Option<f64>,
    /// Meters per second.
    pub max_speed: Option<f64>,
    /// Meters.
    pub total_ascent: Option<f64>,
    /// Meters.
    pub total_descent: Option<f64>,
    /// Meters.
    pub avg_altitude: Option<f64>,
    pub max_altitude: Option<f64>,
    pub min_altitude: Option<f64>,
    /// Beats per minute.
    pub avg_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub min_heart_rate: Option<f64>,
    /// Steps per minute.
    pub avg_cadence: Option<f64>,
    pub max_cadence: Option<f64>,
    /// Degrees Celsius.
    pub avg_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub total_anaerobic_training_effect: Option<f64>,
}
