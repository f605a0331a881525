//! The parsed activity tree and its document parser.
//!
//! The tree mirrors the document's hierarchy: activities hold laps, laps
//! hold tracks, tracks hold trackpoints. Whole-activity aggregates are
//! computed once, at parse time, so the flattener can populate the session
//! summary without a second walk.

use chrono::DateTime;
use thiserror::Error;

/// Errors occurring while parsing a document into a tree.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The document is not well-formed XML.
    #[error(transparent)]
    Xml(#[from] roxmltree::Error),
    /// The document holds no activity elements.
    #[error("Document holds no activities.")]
    NoActivities,
}

/// Root of a parsed document.
#[derive(Debug, Clone, Default)]
pub struct ActivityTree {
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone)]
pub struct Activity {
    pub laps: Vec<Lap>,
    pub summary: ActivitySummary,
}

#[derive(Debug, Clone)]
pub struct Lap {
    /// Unix seconds parsed from the lap's start-time attribute.
    pub start_time: Option<i64>,
    /// Seconds.
    pub total_time_seconds: Option<f64>,
    /// Meters.
    pub distance_meters: Option<f64>,
    /// Kilocalories, aggregated per activity but absent per output lap.
    pub calories: Option<f64>,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub trackpoints: Vec<Trackpoint>,
}

/// One sample as stored in the document. Positions are already degrees and
/// distances already meters; no angular or epoch conversion applies.
#[derive(Debug, Clone, Default)]
pub struct Trackpoint {
    /// Unix seconds, absent when the document's timestamp did not parse.
    pub time: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Meters, cumulative.
    pub distance: Option<f64>,
    /// Meters.
    pub elevation: Option<f64>,
    /// Steps per minute.
    pub cadence: Option<f64>,
    /// Beats per minute.
    pub heart_rate: Option<f64>,
}

/// Whole-activity aggregates computed at parse time.
#[derive(Debug, Clone, Default)]
pub struct ActivitySummary {
    pub started_at: Option<i64>,
    pub ended_at: Option<i64>,
    /// Seconds, summed over laps.
    pub total_time: Option<f64>,
    /// Meters, summed over laps.
    pub total_distance: Option<f64>,
    pub total_calories: Option<f64>,
    pub elevation_gain: Option<f64>,
    pub elevation_loss: Option<f64>,
    pub elevation_max: Option<f64>,
    pub elevation_min: Option<f64>,
    pub speed_avg: Option<f64>,
    pub speed_max: Option<f64>,
    pub heart_rate_avg: Option<f64>,
    pub heart_rate_max: Option<f64>,
    pub heart_rate_min: Option<f64>,
    pub cadence_avg: Option<f64>,
    pub cadence_max: Option<f64>,
    pub start_point: Option<(f64, f64)>,
}

/// Parse a document into an activity tree.
pub fn parse(document: &str) -> Result<ActivityTree, TreeError> {
    let doc = roxmltree::Document::parse(document)?;

    let mut activities = Vec::new();
    for activity in doc
        .descendants()
        .filter(|n| n.has_tag_name("Activity"))
    {
        let mut laps = Vec::new();
        for lap in activity.children().filter(|n| n.has_tag_name("Lap")) {
            let tracks = lap
                .children()
                .filter(|n| n.has_tag_name("Track"))
                .map(|track| Track {
                    trackpoints: track
                        .children()
                        .filter(|n| n.has_tag_name("Trackpoint"))
                        .map(|tp| parse_trackpoint(&tp))
                        .collect(),
                })
                .collect();

            laps.push(Lap {
                start_time: lap.attribute("StartTime").and_then(parse_time),
                total_time_seconds: child_f64(&lap, "TotalTimeSeconds"),
                distance_meters: child_f64(&lap, "DistanceMeters"),
                calories: child_f64(&lap, "Calories"),
                tracks,
            });
        }

        let summary = summarize(&laps);
        activities.push(Activity { laps, summary });
    }

    if activities.is_empty() {
        return Err(TreeError::NoActivities);
    }

    Ok(ActivityTree { activities })
}

fn parse_trackpoint(node: &roxmltree::Node<'_, '_>) -> Trackpoint {
    let position = node.children().find(|n| n.has_tag_name("Position"));

    Trackpoint {
        time: child_text(node, "Time").and_then(parse_time),
        latitude: position
            .as_ref()
            .and_then(|p| child_f64(p, "LatitudeDegrees")),
        longitude: position
            .as_ref()
            .and_then(|p| child_f64(p, "LongitudeDegrees")),
        distance: child_f64(node, "DistanceMeters"),
        elevation: child_f64(node, "AltitudeMeters"),
        cadence: child_f64(node, "Cadence"),
        heart_rate: node
            .children()
            .find(|n| n.has_tag_name("HeartRateBpm"))
            .and_then(|hr| child_f64(&hr, "Value")),
    }
}

fn child_text<'a>(node: &roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
}

fn child_f64(node: &roxmltree::Node<'_, '_>, name: &str) -> Option<f64> {
    child_text(node, name).and_then(|t| t.trim().parse().ok())
}

/// Parse an ISO-8601 UTC timestamp to Unix seconds.
fn parse_time(text: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|t| t.timestamp())
}

/// Compute whole-activity aggregates from the lap tree.
fn summarize(laps: &[Lap]) -> ActivitySummary {
    let mut summary = ActivitySummary {
        total_time: sum_present(laps.iter().map(|l| l.total_time_seconds)),
        total_distance: sum_present(laps.iter().map(|l| l.distance_meters)),
        total_calories: sum_present(laps.iter().map(|l| l.calories)),
        ..Default::default()
    };

    let points = laps
        .iter()
        .flat_map(|l| &l.tracks)
        .flat_map(|t| &t.trackpoints);

    let mut previous: Option<&Trackpoint> = None;
    let mut heart_rates = Stat::default();
    let mut cadences = Stat::default();

    for point in points {
        if summary.started_at.is_none() {
            summary.started_at = point.time;
        }
        summary.ended_at = point.time.or(summary.ended_at);

        if summary.start_point.is_none() {
            if let (Some(lat), Some(lng)) = (point.latitude, point.longitude) {
                summary.start_point = Some((lat, lng));
            }
        }

        if let Some(z) = point.elevation {
            summary.elevation_max = Some(summary.elevation_max.map_or(z, |m| m.max(z)));
            summary.elevation_min = Some(summary.elevation_min.map_or(z, |m| m.min(z)));

            if let Some(pz) = previous.and_then(|p| p.elevation) {
                let dz = z - pz;
                if dz > 0.0 {
                    summary.elevation_gain = Some(summary.elevation_gain.unwrap_or(0.0) + dz);
                } else {
                    summary.elevation_loss = Some(summary.elevation_loss.unwrap_or(0.0) - dz);
                }
            }
        }

        if let (Some(p), Some(t), Some(d)) = (previous, point.time, point.distance) {
            if let (Some(pt), Some(pd)) = (p.time, p.distance) {
                let dt = t - pt;
                if dt > 0 {
                    let v = (d - pd) / dt as f64;
                    summary.speed_max = Some(summary.speed_max.map_or(v, |m| m.max(v)));
                }
            }
        }

        heart_rates.observe(point.heart_rate);
        cadences.observe(point.cadence);

        previous = Some(point);
    }

    if let (Some(start), Some(end)) = (summary.started_at, summary.ended_at) {
        if end > start {
            if let Some(distance) = summary.total_distance {
                summary.speed_avg = Some(distance / (end - start) as f64);
            }
        }
    }

    summary.heart_rate_avg = heart_rates.avg();
    summary.heart_rate_max = heart_rates.max;
    summary.heart_rate_min = heart_rates.min;
    summary.cadence_avg = cadences.avg();
    summary.cadence_max = cadences.max;

    summary
}

fn sum_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    values
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

#[derive(Debug, Default)]
struct Stat {
    sum: f64,
    count: usize,
    max: Option<f64>,
    min: Option<f64>,
}

impl Stat {
    fn observe(&mut self, value: Option<f64>) {
        let Some(v) = value else { return };
        self.sum += v;
        self.count += 1;
        self.max = Some(self.max.map_or(v, |m| m.max(v)));
        self.min = Some(self.min.map_or(v, |m| m.min(v)));
    }

    fn avg(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}
