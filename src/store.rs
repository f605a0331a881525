//! Pre-sized output arrays and axis-extent bookkeeping.

use crate::error::{DecodeError, RecordKind};
use crate::record::{LapRecord, SampleRecord, SessionSummary};

/// Running minimum/maximum of the values backing one plot channel.
///
/// Used by callers to establish initial axis and view bounds. Starts
/// inverted and stays inverted while no pair of values has been observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
        }
    }
}

impl Extent {
    fn observe(&mut self, x: Option<f64>, y: Option<f64>) {
        let (Some(x), Some(y)) = (x, y) else { return };

        self.x_min = self.x_min.min(x);
        self.x_max = self.x_max.max(x);
        self.y_min = self.y_min.min(y);
        self.y_max = self.y_max.max(y);
    }

    /// Whether at least one (x, y) pair has been observed.
    pub fn is_bounded(&self) -> bool {
        self.x_min <= self.x_max
    }
}

/// Owns the output of a single decode invocation.
///
/// Each decode fills a fresh store; old arrays are discarded wholesale, not
/// mutated in place. Appends beyond the declared capacities are reported,
/// never silently truncated or overrun.
#[derive(Debug, Clone)]
pub struct RecordStore {
    samples: Vec<SampleRecord>,
    laps: Vec<LapRecord>,
    session: SessionSummary,

    sample_capacity: usize,
    lap_capacity: usize,

    /// Cumulative distance vs. speed.
    pub pace_extent: Extent,
    /// Cumulative distance vs. cadence.
    pub cadence_extent: Extent,
    /// Cumulative distance vs. heart rate.
    pub heart_rate_extent: Extent,
    /// Cumulative distance vs. altitude.
    pub altitude_extent: Extent,
    /// Lap distance vs. lap elapsed time.
    pub lap_extent: Extent,
}

impl RecordStore {
    pub fn new(sample_capacity: usize, lap_capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(sample_capacity),
            laps: Vec::with_capacity(lap_capacity),
            session: SessionSummary::default(),
            sample_capacity,
            lap_capacity,
            pace_extent: Extent::default(),
            cadence_extent: Extent::default(),
            heart_rate_extent: Extent::default(),
            altitude_extent: Extent::default(),
            lap_extent: Extent::default(),
        }
    }

    pub fn samples(&self) -> &[SampleRecord] {
        &self.samples
    }

    pub fn laps(&self) -> &[LapRecord] {
        &self.laps
    }

    pub fn session(&self) -> &SessionSummary {
        &self.session
    }

    /// Append a sample, updating the per-channel extents.
    pub fn push_sample(&mut self, sample: SampleRecord) -> Result<(), DecodeError> {
        if self.samples.len() == self.sample_capacity {
            return Err(DecodeError::CapacityExceeded {
                kind: RecordKind::Sample,
                capacity: self.sample_capacity,
            });
        }

        self.pace_extent.observe(sample.distance, sample.speed);
        self.cadence_extent.observe(sample.distance, sample.cadence);
        self.heart_rate_extent
            .observe(sample.distance, sample.heart_rate);
        self.altitude_extent.observe(sample.distance, sample.altitude);

        self.samples.push(sample);
        Ok(())
    }

    /// Append a lap, updating the lap extent.
    pub fn push_lap(&mut self, lap: LapRecord) -> Result<(), DecodeError> {
        if self.laps.len() == self.lap_capacity {
            return Err(DecodeError::CapacityExceeded {
                kind: RecordKind::Lap,
                capacity: self.lap_capacity,
            });
        }

        self.lap_extent
            .observe(lap.total_distance, lap.total_elapsed_time);

        self.laps.push(lap);
        Ok(())
    }

    pub fn set_session(&mut self, session: SessionSummary) {
        self.session = session;
    }

    /// The previously appended sample, used for delta-derived speeds.
    pub fn last_sample(&self) -> Option<&SampleRecord> {
        self.samples.last()
    }
}
