use musette::convert::GARMIN_EPOCH_OFFSET;
use musette::error::{DecodeError, RecordKind};
use musette::fit::decode_reader;
use musette::fit::stream::compute_crc;
use musette::store::RecordStore;

/// A definition record binding a local message to a global number, little
/// endian, with (number, size, base type) field triples.
fn definition(local: u8, global: u16, fields: &[(u8, u8, u8)]) -> Vec<u8> {
    let mut out = vec![0x40 | local, 0, 0];
    out.extend_from_slice(&global.to_le_bytes());
    out.push(fields.len() as u8);
    for &(number, size, base_type) in fields {
        out.extend_from_slice(&[number, size, base_type]);
    }
    out
}

fn data(local: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![local];
    out.extend_from_slice(payload);
    out
}

fn file(records: &[Vec<u8>]) -> Vec<u8> {
    file_with(0x20, *b".FIT", &records.concat())
}

fn file_with(protocol: u8, marker: [u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = vec![12, protocol];
    out.extend_from_slice(&2140u16.to_le_bytes());
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&marker);
    out.extend_from_slice(body);
    let crc = compute_crc(0, &out);
    out.extend_from_slice(&crc.to_le_bytes());
    out
}

fn decode(bytes: &[u8], samples: usize, laps: usize) -> Result<RecordStore, DecodeError> {
    let mut store = RecordStore::new(samples, laps);
    decode_reader(&mut &bytes[..], &mut store)?;
    Ok(store)
}

/// A record message carrying timestamp (253) and cumulative distance (5).
fn record(timestamp: u32, distance_cm: u32) -> Vec<u8> {
    let mut payload = timestamp.to_le_bytes().to_vec();
    payload.extend_from_slice(&distance_cm.to_le_bytes());
    data(0, &payload)
}

const RECORD_DEF: &[(u8, u8, u8)] = &[(253, 4, 0x86), (5, 4, 0x86)];

#[test]
fn record_speed_falls_back_to_distance_deltas() {
    let bytes = file(&[
        definition(0, 20, RECORD_DEF),
        record(1000, 0),
        record(1005, 10_000),
        record(1010, 25_000),
    ]);

    let store = decode(&bytes, 16, 4).unwrap();
    let samples = store.samples();
    assert_eq!(samples.len(), 3);

    assert_eq!(samples[0].timestamp, GARMIN_EPOCH_OFFSET + 1000);
    assert_eq!(samples[0].distance, Some(0.0));
    assert_eq!(samples[2].distance, Some(250.0));

    // No speed field was defined: the first sample has no interval to
    // derive one over, the rest get the delta over the previous sample.
    assert_eq!(samples[0].speed, None);
    assert_eq!(samples[1].speed, Some(20.0));
    assert_eq!(samples[2].speed, Some(30.0));
}

#[test]
fn recorded_speed_wins_over_deltas() {
    let def = definition(0, 20, &[(253, 4, 0x86), (5, 4, 0x86), (6, 2, 0x84)]);
    let rec = |t: u32, d: u32, s: u16| {
        let mut payload = t.to_le_bytes().to_vec();
        payload.extend_from_slice(&d.to_le_bytes());
        payload.extend_from_slice(&s.to_le_bytes());
        data(0, &payload)
    };
    let bytes = file(&[def, rec(1000, 0, 2500), rec(1005, 10_000, 2750)]);

    let store = decode(&bytes, 16, 4).unwrap();
    assert_eq!(store.samples()[0].speed, Some(2.5));
    assert_eq!(store.samples()[1].speed, Some(2.75));
}

#[test]
fn lap_messages_land_in_the_lap_array() {
    let lap_def = definition(1, 19, &[(253, 4, 0x86), (9, 4, 0x86), (7, 4, 0x86)]);
    let mut payload = 1060u32.to_le_bytes().to_vec();
    payload.extend_from_slice(&25_000u32.to_le_bytes());
    payload.extend_from_slice(&60_000u32.to_le_bytes());

    let bytes = file(&[
        definition(0, 20, RECORD_DEF),
        record(1000, 0),
        lap_def,
        data(1, &payload),
    ]);

    let store = decode(&bytes, 16, 4).unwrap();
    assert_eq!(store.samples().len(), 1);
    assert_eq!(store.laps().len(), 1);

    let lap = &store.laps()[0];
    assert_eq!(lap.timestamp, GARMIN_EPOCH_OFFSET + 1060);
    assert_eq!(lap.total_distance, Some(250.0));
    assert_eq!(lap.total_elapsed_time, Some(60.0));
    assert_eq!(lap.total_calories, None);
}

#[test]
fn compressed_timestamp_headers_carry_data() {
    // Bit 7 set, local message in bits 5..7, offset in bits 0..5.
    let mut compressed = vec![0x80 | 5];
    compressed.extend_from_slice(&1005u32.to_le_bytes());
    compressed.extend_from_slice(&10_000u32.to_le_bytes());

    let bytes = file(&[definition(0, 20, RECORD_DEF), record(1000, 0), compressed]);

    let store = decode(&bytes, 16, 4).unwrap();
    assert_eq!(store.samples().len(), 2);
    assert_eq!(store.samples()[1].distance, Some(100.0));
}

#[test]
fn compressed_offset_reconstructs_timestamp() {
    // The second definition carries no timestamp field at all: the time
    // arrives only through the compressed header's 5-bit offset.
    let distance_def = definition(1, 20, &[(5, 4, 0x86)]);
    let mut compressed = vec![0x80 | (1 << 5) | 13];
    compressed.extend_from_slice(&10_000u32.to_le_bytes());

    let bytes = file(&[
        definition(0, 20, RECORD_DEF),
        record(1000, 0),
        distance_def,
        compressed,
    ]);

    let store = decode(&bytes, 16, 4).unwrap();
    let samples = store.samples();
    assert_eq!(samples.len(), 2);

    // 1000 has low bits 8, so offset 13 lands in the same 32-second
    // window: 992 + 13.
    assert_eq!(samples[1].timestamp, GARMIN_EPOCH_OFFSET + 1005);
    assert_eq!(samples[1].distance, Some(100.0));
    assert_eq!(samples[1].speed, Some(20.0));
}

#[test]
fn compressed_offset_rolls_over_every_32_seconds() {
    let distance_def = definition(1, 20, &[(5, 4, 0x86)]);
    let compressed = |offset: u8, d: u32| {
        let mut out = vec![0x80 | (1 << 5) | offset];
        out.extend_from_slice(&d.to_le_bytes());
        out
    };

    let bytes = file(&[
        definition(0, 20, RECORD_DEF),
        record(1000, 0),
        distance_def,
        compressed(13, 10_000),
        compressed(2, 20_000),
    ]);

    let store = decode(&bytes, 16, 4).unwrap();
    let samples = store.samples();
    assert_eq!(samples.len(), 3);
    assert_eq!(samples[1].timestamp, GARMIN_EPOCH_OFFSET + 1005);

    // Offset 2 is below 1005's low bits, so the window advances: 992 + 2
    // + 32.
    assert_eq!(samples[2].timestamp, GARMIN_EPOCH_OFFSET + 1026);
}

#[test]
fn big_endian_architecture_is_honored() {
    let mut def = vec![0x40, 0, 1];
    def.extend_from_slice(&20u16.to_be_bytes());
    def.push(1);
    def.extend_from_slice(&[253, 4, 0x86]);

    let mut rec = vec![0x00];
    rec.extend_from_slice(&4000u32.to_be_bytes());

    let store = decode(&file(&[def, rec]), 4, 4).unwrap();
    assert_eq!(store.samples()[0].timestamp, GARMIN_EPOCH_OFFSET + 4000);
}

#[test]
fn sample_overflow_is_reported_not_truncated() {
    let bytes = file(&[
        definition(0, 20, RECORD_DEF),
        record(1000, 0),
        record(1005, 10_000),
        record(1010, 25_000),
    ]);

    let err = decode(&bytes, 2, 4).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::CapacityExceeded {
            kind: RecordKind::Sample,
            capacity: 2,
        }
    ));
}

#[test]
fn lap_overflow_is_reported_not_truncated() {
    let lap_def = definition(1, 19, &[(253, 4, 0x86), (9, 4, 0x86)]);
    let lap = |t: u32, d: u32| {
        let mut payload = t.to_le_bytes().to_vec();
        payload.extend_from_slice(&d.to_le_bytes());
        data(1, &payload)
    };
    let bytes = file(&[lap_def, lap(1060, 25_000), lap(1120, 50_000)]);

    let err = decode(&bytes, 4, 1).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::CapacityExceeded {
            kind: RecordKind::Lap,
            capacity: 1,
        }
    ));
}

#[test]
fn all_sentinel_session_yields_no_values() {
    let def = definition(
        2,
        18,
        &[
            (253, 4, 0x86),
            (2, 4, 0x86),
            (9, 4, 0x86),
            (14, 2, 0x84),
            (16, 1, 0x02),
            (57, 1, 0x01),
        ],
    );
    let mut payload = u32::MAX.to_le_bytes().to_vec();
    payload.extend_from_slice(&u32::MAX.to_le_bytes());
    payload.extend_from_slice(&u32::MAX.to_le_bytes());
    payload.extend_from_slice(&u16::MAX.to_le_bytes());
    payload.push(u8::MAX);
    payload.push(i8::MAX as u8);

    let store = decode(&file(&[def, data(2, &payload)]), 4, 4).unwrap();
    let session = store.session();
    assert_eq!(session.end_time, None);
    assert_eq!(session.start_time, None);
    assert_eq!(session.total_distance, None);
    assert_eq!(session.avg_speed, None);
    assert_eq!(session.avg_heart_rate, None);
    assert_eq!(session.avg_temperature, None);
}

#[test]
fn present_session_fields_are_scaled() {
    let def = definition(
        2,
        18,
        &[
            (253, 4, 0x86),
            (2, 4, 0x86),
            (9, 4, 0x86),
            (14, 2, 0x84),
            (16, 1, 0x02),
            (57, 1, 0x01),
        ],
    );
    let mut payload = 2060u32.to_le_bytes().to_vec();
    payload.extend_from_slice(&2000u32.to_le_bytes());
    payload.extend_from_slice(&100_000u32.to_le_bytes());
    payload.extend_from_slice(&2500u16.to_le_bytes());
    payload.push(140);
    payload.push(25i8 as u8);

    let store = decode(&file(&[def, data(2, &payload)]), 4, 4).unwrap();
    let session = store.session();
    assert_eq!(session.start_time, Some(GARMIN_EPOCH_OFFSET + 2000));
    assert_eq!(session.end_time, Some(GARMIN_EPOCH_OFFSET + 2060));
    assert_eq!(session.total_distance, Some(1000.0));
    assert_eq!(session.avg_speed, Some(2.5));
    assert_eq!(session.avg_heart_rate, Some(140.0));
    assert_eq!(session.avg_temperature, Some(25.0));
}

#[test]
fn unknown_globals_are_skipped_without_error() {
    let def = definition(0, 147, &[(0, 2, 0x84)]);
    let bytes = file(&[def, data(0, &7u16.to_le_bytes())]);

    let store = decode(&bytes, 4, 4).unwrap();
    assert!(store.samples().is_empty());
    assert!(store.laps().is_empty());
}

#[test]
fn wrong_marker_is_unsupported_format() {
    let bytes = file_with(0x20, *b".XYZ", &[]);
    assert!(matches!(
        decode(&bytes, 4, 4).unwrap_err(),
        DecodeError::UnsupportedFormat
    ));
}

#[test]
fn newer_protocol_major_is_rejected() {
    let bytes = file_with(0x30, *b".FIT", &[]);
    assert!(matches!(
        decode(&bytes, 4, 4).unwrap_err(),
        DecodeError::UnsupportedVersion(0x30)
    ));
}

#[test]
fn truncated_stream_is_reported() {
    let bytes = file(&[definition(0, 20, RECORD_DEF), record(1000, 0)]);
    let cut = &bytes[..bytes.len() - 4];

    assert!(matches!(
        decode(cut, 4, 4).unwrap_err(),
        DecodeError::TruncatedStream
    ));
}

#[test]
fn corrupted_trailer_is_malformed() {
    let mut bytes = file(&[definition(0, 20, RECORD_DEF), record(1000, 0)]);
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    assert!(matches!(
        decode(&bytes, 4, 4).unwrap_err(),
        DecodeError::MalformedStream(_)
    ));
}

#[test]
fn data_without_definition_is_malformed() {
    let bytes = file(&[data(3, &[0, 0, 0, 0])]);
    assert!(matches!(
        decode(&bytes, 4, 4).unwrap_err(),
        DecodeError::MalformedStream(_)
    ));
}
