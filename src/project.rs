//! Projection of normalized SI records into display units.
//!
//! Stored values stay SI; everything unit-dependent is derived on demand
//! from the record store, per plot kind and per session field.

use crate::convert::apply_tz_offset;
use crate::record::SessionSummary;
use crate::store::{Extent, RecordStore};

pub const METERS_TO_KILOMETERS: f64 = 0.001;
pub const METERS_TO_MILES: f64 = 0.000_621_371_19;
/// m/s to the km·min⁻¹ pace scale.
pub const SPEED_TO_METRIC_PACE: f64 = 0.06;
/// m/s to the mi·min⁻¹ pace scale.
pub const SPEED_TO_ENGLISH_PACE: f64 = 0.037_282_272;
pub const SPEED_TO_KMH: f64 = 3.6;
pub const SPEED_TO_MPH: f64 = 2.236_936_3;
pub const METERS_TO_FEET: f64 = 3.280_839_9;
pub const JOULES_TO_KILOJOULES: f64 = 0.001;
pub const SECONDS_TO_MINUTES: f64 = 1.0 / 60.0;

/// Display value standing in for an infinitely slow pace.
pub const PACE_SLOWEST: f64 = 999.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitSystem {
    #[default]
    Metric,
    English,
}

/// The five derived plot channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    Pace,
    Cadence,
    HeartRate,
    Altitude,
    Lap,
}

/// Conversion factors from SI to display units for one channel.
///
/// X is always a distance; Y depends on the channel.
fn factors(kind: PlotKind, units: UnitSystem) -> (f64, f64) {
    let x = match units {
        UnitSystem::Metric => METERS_TO_KILOMETERS,
        UnitSystem::English => METERS_TO_MILES,
    };

    let y = match (kind, units) {
        (PlotKind::Pace, UnitSystem::Metric) => SPEED_TO_METRIC_PACE,
        (PlotKind::Pace, UnitSystem::English) => SPEED_TO_ENGLISH_PACE,
        (PlotKind::Cadence | PlotKind::HeartRate, _) => 1.0,
        (PlotKind::Altitude, UnitSystem::Metric) => 1.0,
        (PlotKind::Altitude, UnitSystem::English) => METERS_TO_FEET,
        (PlotKind::Lap, _) => SECONDS_TO_MINUTES,
    };

    (x, y)
}

/// Axis labels for one channel.
pub fn axis_labels(kind: PlotKind, units: UnitSystem) -> (&'static str, &'static str) {
    let distance = match units {
        UnitSystem::Metric => "Distance(km)",
        UnitSystem::English => "Distance(miles)",
    };

    match (kind, units) {
        (PlotKind::Pace, UnitSystem::Metric) => (distance, "Pace(min/km)"),
        (PlotKind::Pace, UnitSystem::English) => (distance, "Pace(min/mile)"),
        (PlotKind::Cadence, _) => (distance, "Cadence(steps/min)"),
        (PlotKind::HeartRate, _) => (distance, "Heart rate(bpm)"),
        (PlotKind::Altitude, UnitSystem::Metric) => (distance, "Altitude(meters)"),
        (PlotKind::Altitude, UnitSystem::English) => (distance, "Altitude(feet)"),
        (PlotKind::Lap, _) => ("Lap", "Elapsed Split Time(min)"),
    }
}

/// One plottable point: both values present, already in display units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub x: f64,
    pub y: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A display-unit view of one plot channel.
#[derive(Debug, Clone)]
pub struct Series {
    pub kind: PlotKind,
    pub units: UnitSystem,
    pub points: Vec<SeriesPoint>,
    /// Initial axis bounds, in display units.
    pub extent: Extent,
    pub x_label: &'static str,
    pub y_label: &'static str,
}

/// Project one plot channel out of the store.
///
/// Samples missing either backing value contribute no point; they are
/// never coerced to zero.
pub fn series(store: &RecordStore, kind: PlotKind, units: UnitSystem) -> Series {
    let (fx, fy) = factors(kind, units);

    let points = match kind {
        PlotKind::Lap => store
            .laps()
            .iter()
            .filter_map(|lap| {
                Some(SeriesPoint {
                    x: lap.total_distance? * fx,
                    y: lap.total_elapsed_time? * fy,
                    latitude: lap.start_lat,
                    longitude: lap.start_lng,
                })
            })
            .collect(),
        _ => store
            .samples()
            .iter()
            .filter_map(|sample| {
                let y = match kind {
                    PlotKind::Pace => sample.speed,
                    PlotKind::Cadence => sample.cadence,
                    PlotKind::HeartRate => sample.heart_rate,
                    PlotKind::Altitude => sample.altitude,
                    PlotKind::Lap => unreachable!(),
                };
                Some(SeriesPoint {
                    x: sample.distance? * fx,
                    y: y? * fy,
                    latitude: sample.latitude,
                    longitude: sample.longitude,
                })
            })
            .collect(),
    };

    let raw = match kind {
        PlotKind::Pace => store.pace_extent,
        PlotKind::Cadence => store.cadence_extent,
        PlotKind::HeartRate => store.heart_rate_extent,
        PlotKind::Altitude => store.altitude_extent,
        PlotKind::Lap => store.lap_extent,
    };

    // The factors are positive scales, so min/max ordering survives. An
    // extent that never observed a pair stays at its inverted start.
    let extent = if raw.is_bounded() {
        Extent {
            x_min: raw.x_min * fx,
            x_max: raw.x_max * fx,
            y_min: raw.y_min * fy,
            y_max: raw.y_max * fy,
        }
    } else {
        Extent::default()
    };

    let (x_label, y_label) = axis_labels(kind, units);

    Series {
        kind,
        units,
        points,
        extent,
        x_label,
        y_label,
    }
}

/// Render an already-converted pace-scale value as `mm:ss` per unit
/// distance. Non-positive values map to the fixed slowest display.
pub fn format_pace(value: f64) -> String {
    let pace = if value > 0.0 { 1.0 / value } else { PACE_SLOWEST };
    let minutes = pace.trunc();
    let seconds = pace.fract() * 60.0;
    format!("{minutes:02.0}:{seconds:02.0}")
}

/// Render a stored UTC timestamp in the caller's local time.
pub fn format_local_time(unix_ts: i64, tz_offset: i64) -> Option<String> {
    let shifted = apply_tz_offset(unix_ts, tz_offset);
    chrono::DateTime::from_timestamp(shifted, 0).map(|t| t.format("%a %b %e %H:%M:%S %Y").to_string())
}

/// The session summary in display units.
///
/// Absent fields stay absent; presence is never decided here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionDisplay {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub start_position_lat: Option<f64>,
    pub start_position_long: Option<f64>,
    /// Seconds.
    pub total_elapsed_time: Option<f64>,
    /// Seconds.
    pub total_timer_time: Option<f64>,
    /// Kilometers or miles.
    pub total_distance: Option<f64>,
    pub nec_lat: Option<f64>,
    pub nec_long: Option<f64>,
    pub swc_lat: Option<f64>,
    pub swc_long: Option<f64>,
    /// Kilojoules, unit-independent.
    pub total_work: Option<f64>,
    pub total_moving_time: Option<f64>,
    pub avg_lap_time: Option<f64>,
    pub total_calories: Option<f64>,
    /// km/h or mph.
    pub avg_speed: Option<f64>,
    pub max_speed: Option<f64>,
    /// Meters or feet.
    pub total_ascent: Option<f64>,
    pub total_descent: Option<f64>,
    pub avg_altitude: Option<f64>,
    pub max_altitude: Option<f64>,
    pub min_altitude: Option<f64>,
    pub avg_heart_rate: Option<f64>,
    pub max_heart_rate: Option<f64>,
    pub min_heart_rate: Option<f64>,
    pub avg_cadence: Option<f64>,
    pub max_cadence: Option<f64>,
    /// °C or °F.
    pub avg_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub total_anaerobic_training_effect: Option<f64>,
}

/// Project the session summary into display units and local time.
pub fn session_display(
    session: &SessionSummary,
    units: UnitSystem,
    tz_offset: i64,
) -> SessionDisplay {
    let distance = match units {
        UnitSystem::Metric => METERS_TO_KILOMETERS,
        UnitSystem::English => METERS_TO_MILES,
    };
    let speed = match units {
        UnitSystem::Metric => SPEED_TO_KMH,
        UnitSystem::English => SPEED_TO_MPH,
    };
    let altitude = match units {
        UnitSystem::Metric => 1.0,
        UnitSystem::English => METERS_TO_FEET,
    };
    let temperature = |c: f64| match units {
        UnitSystem::Metric => c,
        UnitSystem::English => 1.8 * c + 32.0,
    };

    SessionDisplay {
        start_time: session
            .start_time
            .and_then(|t| format_local_time(t, tz_offset)),
        end_time: session.end_time.and_then(|t| format_local_time(t, tz_offset)),
        start_position_lat: session.start_position_lat,
        start_position_long: session.start_position_long,
        total_elapsed_time: session.total_elapsed_time,
        total_timer_time: session.total_timer_time,
        total_distance: session.total_distance.map(|v| v * distance),
        nec_lat: session.nec_lat,
        nec_long: session.nec_long,
        swc_lat: session.swc_lat,
        swc_long: session.swc_long,
        total_work: session.total_work.map(|v| v * JOULES_TO_KILOJOULES),
        total_moving_time: session.total_moving_time,
        avg_lap_time: session.avg_lap_time,
        total_calories: session.total_calories,
        avg_speed: session.avg_speed.map(|v| v * speed),
        max_speed: session.max_speed.map(|v| v * speed),
        total_ascent: session.total_ascent.map(|v| v * altitude),
        total_descent: session.total_descent.map(|v| v * altitude),
        avg_altitude: session.avg_altitude.map(|v| v * altitude),
        max_altitude: session.max_altitude.map(|v| v * altitude),
        min_altitude: session.min_altitude.map(|v| v * altitude),
        avg_heart_rate: session.avg_heart_rate,
        max_heart_rate: session.max_heart_rate,
        min_heart_rate: session.min_heart_rate,
        avg_cadence: session.avg_cadence,
        max_cadence: session.max_cadence,
        avg_temperature: session.avg_temperature.map(temperature),
        max_temperature: session.max_temperature.map(temperature),
        total_anaerobic_training_effect: session.total_anaerobic_training_effect,
    }
}
