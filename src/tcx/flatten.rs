//! Flattening the activity tree into normalized records.
//!
//! A depth-first walk over activities, laps, tracks, and trackpoints. GPS
//! readings whose latitude and longitude are both within ±0.1° of the
//! origin are treated as unfixed receivers and discarded, so the emitted
//! sample count excludes them.

use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::record::{LapRecord, SampleRecord, SessionSummary};
use crate::store::RecordStore;

use super::tree::{ActivityTree, Lap, Trackpoint};

/// Half-width of the near-origin rejection band, in degrees.
pub const ZERO_THRESHOLD: f64 = 0.1;

/// Whether both coordinates sit in the near-origin rejection band.
///
/// A point recorded without any position is kept; only the simultaneous
/// near-equator, near-prime-meridian signature marks an unfixed receiver.
fn is_unfixed(point: &Trackpoint) -> bool {
    match (point.latitude, point.longitude) {
        (Some(lat), Some(lng)) => lat.abs() <= ZERO_THRESHOLD && lng.abs() <= ZERO_THRESHOLD,
        _ => false,
    }
}

/// Flatten a parsed tree into the store.
pub fn flatten(tree: &ActivityTree, store: &mut RecordStore) -> Result<(), DecodeError> {
    let mut dropped = 0usize;

    for activity in &tree.activities {
        let mut previous_time: Option<i64> = None;
        let mut previous_distance: Option<f64> = None;
        let mut previous_speed: Option<f64> = None;

        for lap in &activity.laps {
            for track in &lap.tracks {
                for point in &track.trackpoints {
                    if is_unfixed(point) {
                        dropped += 1;
                        continue;
                    }

                    let Some(timestamp) = point.time else {
                        // A sample without a resolvable timestamp would be
                        // partial; drop it rather than emit one.
                        warn!("trackpoint without parseable timestamp");
                        dropped += 1;
                        continue;
                    };

                    // Speed is not stored in the document: derive it from
                    // the distance delta when both ends of the interval
                    // resolved, otherwise carry the previous sample's
                    // speed forward. The very first sample has no history
                    // and reports speed as unknown.
                    let delta = match (previous_time, point.distance, previous_distance) {
                        (Some(pt), Some(d), Some(pd)) if timestamp != pt => {
                            Some((d - pd) / (timestamp - pt) as f64)
                        }
                        _ => None,
                    };
                    let speed = delta.or(previous_speed);

                    let sample = SampleRecord {
                        timestamp,
                        latitude: point.latitude,
                        longitude: point.longitude,
                        speed,
                        distance: point.distance,
                        altitude: point.elevation,
                        cadence: point.cadence,
                        heart_rate: point.heart_rate,
                    };
                    store.push_sample(sample)?;

                    previous_time = Some(timestamp);
                    previous_distance = point.distance.or(previous_distance);
                    previous_speed = speed;
                }
            }

            push_lap(lap, store)?;
        }

        store.set_session(summarize_session(activity));
    }

    debug!(
        samples = store.samples().len(),
        laps = store.laps().len(),
        dropped,
        "flattened activity tree"
    );
    Ok(())
}

fn push_lap(lap: &Lap, store: &mut RecordStore) -> Result<(), DecodeError> {
    let first_point = lap
        .tracks
        .first()
        .and_then(|track| track.trackpoints.first());

    // End-of-lap timestamp: the last resolvable trackpoint time, else the
    // lap's declared start. A lap with neither cannot be anchored in time.
    let last_time = lap
        .tracks
        .iter()
        .flat_map(|t| &t.trackpoints)
        .filter_map(|p| p.time)
        .next_back();
    let Some(timestamp) = last_time.or(lap.start_time) else {
        warn!("lap without resolvable timestamp");
        return Ok(());
    };

    // No end position, calories, or timer time exist per lap in this
    // source; those stay absent.
    store.push_lap(LapRecord {
        timestamp,
        start_lat: first_point.and_then(|p| p.latitude),
        start_lng: first_point.and_then(|p| p.longitude),
        end_lat: None,
        end_lng: None,
        total_distance: lap.distance_meters,
        total_calories: None,
        total_elapsed_time: lap.total_time_seconds,
        total_timer_time: None,
    })
}

fn summarize_session(activity: &super::tree::Activity) -> SessionSummary {
    let summary = &activity.summary;

    // Bounding box corners, total work, moving time, average lap time,
    // temperature, and training effect do not exist in this source.
    SessionSummary {
        start_time: summary.started_at,
        end_time: summary.ended_at,
        start_position_lat: summary.start_point.map(|(lat, _)| lat),
        start_position_long: summary.start_point.map(|(_, lng)| lng),
        total_elapsed_time: summary.total_time,
        total_distance: summary.total_distance,
        total_calories: summary.total_calories,
        avg_speed: summary.speed_avg,
        max_speed: summary.speed_max,
        total_ascent: summary.elevation_gain,
        total_descent: summary.elevation_loss,
        max_altitude: summary.elevation_max,
        min_altitude: summary.elevation_min,
        avg_heart_rate: summary.heart_rate_avg,
        max_heart_rate: summary.heart_rate_max,
        min_heart_rate: summary.heart_rate_min,
        avg_cadence: summary.cadence_avg,
        max_cadence: summary.cadence_max,
        ..Default::default()
    }
}
