//! Global message numbers and field numbers for the consumed profile.
//!
//! Only the slice of the FIT profile this pipeline reads is listed. Scales
//! and offsets follow the profile: distance is centimeters, speed is
//! millimeters per second, elapsed times are milliseconds, and altitude is
//! stored as `(meters + 500) × 5`.

/// The messages the dispatcher distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    FileId,
    UserProfile,
    Session,
    Lap,
    Record,
    Event,
    DeviceInfo,
    Activity,
    Unknown(u16),
}

impl MessageKind {
    pub fn from_global(global: u16) -> Self {
        match global {
            0 => Self::FileId,
            3 => Self::UserProfile,
            18 => Self::Session,
            19 => Self::Lap,
            20 => Self::Record,
            21 => Self::Event,
            23 => Self::DeviceInfo,
            34 => Self::Activity,
            n => Self::Unknown(n),
        }
    }
}

/// Field number carrying the timestamp, common to every message.
pub const TIMESTAMP: u8 = 253;

/// Field numbers of the `record` message.
pub mod record {
    pub const POSITION_LAT: u8 = 0;
    pub const POSITION_LONG: u8 = 1;
    pub const ALTITUDE: u8 = 2;
    pub const HEART_RATE: u8 = 3;
    pub const CADENCE: u8 = 4;
    pub const DISTANCE: u8 = 5;
    pub const SPEED: u8 = 6;
}

/// Field numbers of the `lap` message.
pub mod lap {
    pub const START_POSITION_LAT: u8 = 3;
    pub const START_POSITION_LONG: u8 = 4;
    pub const END_POSITION_LAT: u8 = 5;
    pub const END_POSITION_LONG: u8 = 6;
    pub const TOTAL_ELAPSED_TIME: u8 = 7;
    pub const TOTAL_TIMER_TIME: u8 = 8;
    pub const TOTAL_DISTANCE: u8 = 9;
    pub const TOTAL_CALORIES: u8 = 11;
}

/// Field numbers of the `session` message.
pub mod session {
    pub const START_TIME: u8 = 2;
    pub const START_POSITION_LAT: u8 = 3;
    pub const START_POSITION_LONG: u8 = 4;
    pub const TOTAL_ELAPSED_TIME: u8 = 7;
    pub const TOTAL_TIMER_TIME: u8 = 8;
    pub const TOTAL_DISTANCE: u8 = 9;
    pub const TOTAL_CALORIES: u8 = 11;
    pub const AVG_SPEED: u8 = 14;
    pub const MAX_SPEED: u8 = 15;
    pub const AVG_HEART_RATE: u8 = 16;
    pub const MAX_HEART_RATE: u8 = 17;
    pub const AVG_CADENCE: u8 = 18;
    pub const MAX_CADENCE: u8 = 19;
    pub const TOTAL_ASCENT: u8 = 22;
    pub const TOTAL_DESCENT: u8 = 23;
    pub const NEC_LAT: u8 = 29;
    pub const NEC_LONG: u8 = 30;
    pub const SWC_LAT: u8 = 31;
    pub const SWC_LONG: u8 = 32;
    pub const TOTAL_WORK: u8 = 48;
    pub const AVG_ALTITUDE: u8 = 49;
    pub const MAX_ALTITUDE: u8 = 50;
    pub const AVG_TEMPERATURE: u8 = 57;
    pub const MAX_TEMPERATURE: u8 = 58;
    pub const TOTAL_MOVING_TIME: u8 = 59;
    pub const MIN_HEART_RATE: u8 = 64;
    pub const AVG_LAP_TIME: u8 = 69;
    pub const MIN_ALTITUDE: u8 = 71;
    pub const TOTAL_ANAEROBIC_TRAINING_EFFECT: u8 = 137;
}

/// Centimeters to meters.
pub fn distance_m(raw: u32) -> f64 {
    raw as f64 / 100.0
}

/// Millimeters per second to meters per second.
pub fn speed_m_s(raw: u16) -> f64 {
    raw as f64 / 1000.0
}

/// Milliseconds to seconds.
pub fn time_s(raw: u32) -> f64 {
    raw as f64 / 1000.0
}

/// Scaled-and-offset altitude to meters.
pub fn altitude_m(raw: u16) -> f64 {
    raw as f64 / 5.0 - 500.0
}
