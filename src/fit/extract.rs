//! Adapter from the chunked stream decoder to normalized records.
//!
//! Drives a [`StreamDecoder`] in fixed 8-byte chunks, drains every message a
//! chunk completes before supplying the next, and dispatches by global
//! message number. Session, lap, and record fields all follow the same
//! discipline: check the raw integer against its width's reserved encoding,
//! then scale and convert.

use std::io::Read;

use tracing::{debug, trace};

use crate::convert::{garmin_epoch_to_unix, semicircles_to_degrees};
use crate::error::DecodeError;
use crate::record::{LapRecord, SampleRecord, SessionSummary};
use crate::sentinel::{Sentinel, convert};
use crate::store::RecordStore;

use super::profile::{self, MessageKind, TIMESTAMP, altitude_m, distance_m, speed_m_s, time_s};
use super::stream::{Message, Status, StreamDecoder, StreamError, Value};

/// Bytes supplied to the stream decoder per call.
const CHUNK_SIZE: usize = 8;

impl From<StreamError> for DecodeError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::NotFitData => Self::UnsupportedFormat,
            StreamError::UnsupportedProtocol(v) => Self::UnsupportedVersion(v),
            other => Self::MalformedStream(other.to_string()),
        }
    }
}

/// Decode a whole FIT stream into the store.
///
/// Terminal on the first failure; the store must be discarded if an error
/// is returned.
pub fn decode_reader(r: &mut impl Read, store: &mut RecordStore) -> Result<(), DecodeError> {
    let mut decoder = StreamDecoder::new();
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut last_timestamp = None;

    loop {
        let n = r.read(&mut chunk)?;
        if n == 0 {
            // The source is exhausted but the decoder still expects bytes.
            return Err(DecodeError::TruncatedStream);
        }

        let status = decoder.feed(&chunk[..n])?;

        while let Some(message) = decoder.next_message() {
            dispatch(&message, store, &mut last_timestamp)?;
        }

        if status == Status::EndOfFile {
            debug!(
                samples = store.samples().len(),
                laps = store.laps().len(),
                "FIT stream complete"
            );
            return Ok(());
        }
    }
}

fn dispatch(
    message: &Message,
    store: &mut RecordStore,
    last_timestamp: &mut Option<u32>,
) -> Result<(), DecodeError> {
    match MessageKind::from_global(message.global) {
        MessageKind::Record => extract_record(message, store, last_timestamp),
        MessageKind::Lap => extract_lap(message, store, last_timestamp),
        MessageKind::Session => extract_session(message, store, last_timestamp),
        // File ids, user profiles, activities, events, and device info
        // carry nothing the output contract needs; unknown numbers are
        // skipped without error.
        other => {
            trace!(?other, "skipping message");
            Ok(())
        }
    }
}

/// The last value received for a field number, with the expected width.
fn field_u8(message: &Message, number: u8) -> Option<u8> {
    last_field(message, number, Value::as_u8)
}

fn field_u16(message: &Message, number: u8) -> Option<u16> {
    last_field(message, number, Value::as_u16)
}

fn field_u32(message: &Message, number: u8) -> Option<u32> {
    last_field(message, number, Value::as_u32)
}

fn field_i8(message: &Message, number: u8) -> Option<i8> {
    last_field(message, number, Value::as_i8)
}

fn field_i32(message: &Message, number: u8) -> Option<i32> {
    last_field(message, number, Value::as_i32)
}

fn last_field<T>(message: &Message, number: u8, as_t: fn(Value) -> Option<T>) -> Option<T> {
    message
        .fields
        .iter()
        .rev()
        .find(|f| f.number == number)
        .and_then(|f| as_t(f.value))
}

/// The message's raw timestamp, in Garmin epoch seconds.
///
/// Taken from the timestamp field when it was recorded, otherwise
/// reconstructed from a compressed header's 5-bit offset against the low
/// bits of the last full timestamp, rolling the 32-second window forward
/// when the offset wraps.
fn raw_timestamp(message: &Message, last: &mut Option<u32>) -> Option<u32> {
    let raw = field_u32(message, TIMESTAMP)
        .and_then(Sentinel::present)
        .or_else(|| {
            let offset = u32::from(message.time_offset?);
            let base = (*last)?;

            let mut t = (base & !0x1F) + offset;
            if offset < base & 0x1F {
                t += 0x20;
            }
            Some(t)
        });

    if raw.is_some() {
        *last = raw;
    }
    raw
}

fn extract_record(
    message: &Message,
    store: &mut RecordStore,
    last_timestamp: &mut Option<u32>,
) -> Result<(), DecodeError> {
    use profile::record::*;

    // A sample without a resolvable timestamp would be a partial record;
    // skip it rather than emit one.
    let Some(timestamp) = raw_timestamp(message, last_timestamp).map(garmin_epoch_to_unix) else {
        trace!("record message without timestamp");
        return Ok(());
    };

    let distance = field_u32(message, DISTANCE).and_then(|v| convert(v, distance_m));

    // Prefer the device's own speed; fall back to the delta over the
    // previous sample when the field was never recorded.
    let speed = field_u16(message, SPEED)
        .and_then(|v| convert(v, speed_m_s))
        .or_else(|| delta_speed(store, timestamp, distance));

    let sample = SampleRecord {
        timestamp,
        latitude: field_i32(message, POSITION_LAT).and_then(|v| convert(v, semicircles_to_degrees)),
        longitude: field_i32(message, POSITION_LONG)
            .and_then(|v| convert(v, semicircles_to_degrees)),
        speed,
        distance,
        altitude: field_u16(message, ALTITUDE).and_then(|v| convert(v, altitude_m)),
        cadence: field_u8(message, CADENCE).and_then(|v| convert(v, f64::from)),
        heart_rate: field_u8(message, HEART_RATE).and_then(|v| convert(v, f64::from)),
    };

    store.push_sample(sample)
}

fn delta_speed(store: &RecordStore, timestamp: i64, distance: Option<f64>) -> Option<f64> {
    let previous = store.last_sample()?;
    let dt = timestamp - previous.timestamp;
    if dt <= 0 {
        return None;
    }

    let dd = distance? - previous.distance?;
    Some(dd / dt as f64)
}

fn extract_lap(
    message: &Message,
    store: &mut RecordStore,
    last_timestamp: &mut Option<u32>,
) -> Result<(), DecodeError> {
    use profile::lap::*;

    let Some(timestamp) = raw_timestamp(message, last_timestamp).map(garmin_epoch_to_unix) else {
        trace!("lap message without timestamp");
        return Ok(());
    };

    let lap = LapRecord {
        timestamp,
        start_lat: field_i32(message, START_POSITION_LAT)
            .and_then(|v| convert(v, semicircles_to_degrees)),
        start_lng: field_i32(message, START_POSITION_LONG)
            .and_then(|v| convert(v, semicircles_to_degrees)),
        end_lat: field_i32(message, END_POSITION_LAT)
            .and_then(|v| convert(v, semicircles_to_degrees)),
        end_lng: field_i32(message, END_POSITION_LONG)
            .and_then(|v| convert(v, semicircles_to_degrees)),
        total_distance: field_u32(message, TOTAL_DISTANCE).and_then(|v| convert(v, distance_m)),
        total_calories: field_u16(message, TOTAL_CALORIES).and_then(|v| convert(v, f64::from)),
        total_elapsed_time: field_u32(message, TOTAL_ELAPSED_TIME).and_then(|v| convert(v, time_s)),
        total_timer_time: field_u32(message, TOTAL_TIMER_TIME).and_then(|v| convert(v, time_s)),
    };

    store.push_lap(lap)
}

fn extract_session(
    message: &Message,
    store: &mut RecordStore,
    last_timestamp: &mut Option<u32>,
) -> Result<(), DecodeError> {
    use profile::session::*;

    let session = SessionSummary {
        start_time: field_u32(message, START_TIME).and_then(|t| convert(t, garmin_epoch_to_unix)),
        end_time: raw_timestamp(message, last_timestamp).map(garmin_epoch_to_unix),
        start_position_lat: field_i32(message, START_POSITION_LAT)
            .and_then(|v| convert(v, semicircles_to_degrees)),
        start_position_long: field_i32(message, START_POSITION_LONG)
            .and_then(|v| convert(v, semicircles_to_degrees)),
        total_elapsed_time: field_u32(message, TOTAL_ELAPSED_TIME).and_then(|v| convert(v, time_s)),
        total_timer_time: field_u32(message, TOTAL_TIMER_TIME).and_then(|v| convert(v, time_s)),
        total_distance: field_u32(message, TOTAL_DISTANCE).and_then(|v| convert(v, distance_m)),
        nec_lat: field_i32(message, NEC_LAT).and_then(|v| convert(v, semicircles_to_degrees)),
        nec_long: field_i32(message, NEC_LONG).and_then(|v| convert(v, semicircles_to_degrees)),
        swc_lat: field_i32(message, SWC_LAT).and_then(|v| convert(v, semicircles_to_degrees)),
        swc_long: field_i32(message, SWC_LONG).and_then(|v| convert(v, semicircles_to_degrees)),
        total_work: field_u32(message, TOTAL_WORK).and_then(|v| convert(v, f64::from)),
        total_moving_time: field_u32(message, TOTAL_MOVING_TIME).and_then(|v| convert(v, time_s)),
        avg_lap_time: field_u32(message, AVG_LAP_TIME).and_then(|v| convert(v, time_s)),
        total_calories: field_u16(message, TOTAL_CALORIES).and_then(|v| convert(v, f64::from)),
        avg_speed: field_u16(message, AVG_SPEED).and_then(|v| convert(v, speed_m_s)),
        max_speed: field_u16(message, MAX_SPEED).and_then(|v| convert(v, speed_m_s)),
        total_ascent: field_u16(message, TOTAL_ASCENT).and_then(|v| convert(v, f64::from)),
        total_descent: field_u16(message, TOTAL_DESCENT).and_then(|v| convert(v, f64::from)),
        avg_altitude: field_u16(message, AVG_ALTITUDE).and_then(|v| convert(v, altitude_m)),
        max_altitude: field_u16(message, MAX_ALTITUDE).and_then(|v| convert(v, altitude_m)),
        min_altitude: field_u16(message, MIN_ALTITUDE).and_then(|v| convert(v, altitude_m)),
        avg_heart_rate: field_u8(message, AVG_HEART_RATE).and_then(|v| convert(v, f64::from)),
        max_heart_rate: field_u8(message, MAX_HEART_RATE).and_then(|v| convert(v, f64::from)),
        min_heart_rate: field_u8(message, MIN_HEART_RATE).and_then(|v| convert(v, f64::from)),
        avg_cadence: field_u8(message, AVG_CADENCE).and_then(|v| convert(v, f64::from)),
        max_cadence: field_u8(message, MAX_CADENCE).and_then(|v| convert(v, f64::from)),
        avg_temperature: field_i8(message, AVG_TEMPERATURE).and_then(|v| convert(v, f64::from)),
        max_temperature: field_i8(message, MAX_TEMPERATURE).and_then(|v| convert(v, f64::from)),
        total_anaerobic_training_effect: field_u8(message, TOTAL_ANAEROBIC_TRAINING_EFFECT)
            .and_then(|v| convert(v, |v| v as f64 / 10.0)),
    };

    store.set_session(session);
    Ok(())
}
