//! Chunked push decoder for the FIT container.
//!
//! The decoder is fed fixed-size byte chunks and buffers them until a whole
//! item (file header, definition record, data record, or trailer) is
//! available, so a single chunk may complete zero or more messages. Decoded
//! data messages are queued and drained through [`StreamDecoder::next_message`].
//!
//! Field values are surfaced raw: the reserved "field not recorded"
//! encodings pass through untouched and are mapped to absent values once,
//! at extraction (see [`crate::sentinel`]).
//!
//! All decoder state lives in the [`StreamDecoder`] value, so concurrent
//! decodes of different files are independent, and no stale state can
//! survive into a later file.

use std::collections::VecDeque;

use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::FromBytes;

/// The highest protocol major version the decoder accepts.
const SUPPORTED_PROTOCOL_MAJOR: u8 = 2;

/// Outcome of feeding a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// More bytes are needed; no messages are waiting.
    Continue,
    /// At least one decoded message is waiting to be drained.
    MessageAvailable,
    /// The trailer has been verified; the stream is complete.
    EndOfFile,
}

/// Errors terminating the stream decode.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Incorrect file type marker.
    #[error("Incorrect file type marker.")]
    NotFitData,
    /// Protocol version newer than supported.
    #[error("Unsupported protocol version ({0}).")]
    UnsupportedProtocol(u8),
    /// Unknown header length.
    #[error("Unknown header length ({0}).")]
    UnknownHeaderLength(u8),
    /// Calculated and found CRC values do not match.
    #[error("Calculated ({calculated}) and found ({found}) CRC values do not match.")]
    CyclicRedundancyCheck { found: u16, calculated: u16 },
    /// A definition field carried an unknown base type.
    #[error("Unknown base type (0x{0:02X}).")]
    UnknownBaseType(u8),
    /// A data record referenced a local message with no stored definition.
    #[error("Data record referenced undefined local message {0}.")]
    UndefinedLocalMessage(u8),
    /// A record would run past the declared end of the record section.
    #[error("Record overruns the declared data size.")]
    Overrun,
    /// Found unsupported developer data.
    #[error("Found unsupported developer data.")]
    Developer,
}

/// A raw field value, decoded to its base-type width but not yet checked
/// against the width's reserved encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    pub fn as_u8(self) -> Option<u8> {
        match self {
            Self::U8(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u16(self) -> Option<u16> {
        match self {
            Self::U16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i8(self) -> Option<i8> {
        match self {
            Self::I8(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(v),
            _ => None,
        }
    }
}

/// One field of a drained message. Array fields are published element by
/// element, repeating the field number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldValue {
    pub number: u8,
    pub value: Value,
}

/// A decoded data message, tagged with its global message number.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub global: u16,
    pub time_offset: Option<u8>,
    pub fields: Vec<FieldValue>,
}

#[derive(Debug, Clone)]
struct FieldDef {
    number: u8,
    size: u8,
    base_type: u8,
}

#[derive(Debug, Clone)]
struct Definition {
    global: u16,
    is_little_endian: bool,
    fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Header,
    Records,
    Trailer,
    Complete,
}

/// Push decoder over a chunked FIT byte stream.
#[derive(Debug)]
pub struct StreamDecoder {
    buf: Vec<u8>,
    pos: usize,
    phase: Phase,
    data_size: usize,
    record_bytes: usize,
    crc: u16,
    definitions: [Option<Definition>; 16],
    queue: VecDeque<Message>,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
            phase: Phase::Header,
            data_size: 0,
            record_bytes: 0,
            crc: 0,
            definitions: Default::default(),
            queue: VecDeque::new(),
        }
    }

    /// Buffer a chunk and decode as many whole items as it completes.
    ///
    /// Returns [`Status::MessageAvailable`] when messages are waiting; the
    /// caller should drain them all with [`Self::next_message`] before
    /// feeding the next chunk. Any error is terminal for the stream.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Status, StreamError> {
        self.buf.extend_from_slice(chunk);

        loop {
            let stepped = match self.phase {
                Phase::Header => self.step_header()?,
                Phase::Records => self.step_record()?,
                Phase::Trailer => self.step_trailer()?,
                Phase::Complete => false,
            };

            if !stepped {
                break;
            }
        }

        self.buf.drain(..self.pos);
        self.pos = 0;

        Ok(if self.phase == Phase::Complete {
            Status::EndOfFile
        } else if !self.queue.is_empty() {
            Status::MessageAvailable
        } else {
            Status::Continue
        })
    }

    /// Drain the next decoded message, if one is waiting.
    pub fn next_message(&mut self) -> Option<Message> {
        self.queue.pop_front()
    }

    fn remaining(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Advance over decoded bytes, folding them into the running CRC.
    fn consume(&mut self, n: usize) {
        let end = self.pos + n;
        self.crc = compute_crc(self.crc, &self.buf[self.pos..end]);
        if self.phase == Phase::Records {
            self.record_bytes += n;
        }
        self.pos = end;
    }

    fn check_overrun(&self, needed: usize) -> Result<(), StreamError> {
        if self.record_bytes + needed > self.data_size {
            Err(StreamError::Overrun)
        } else {
            Ok(())
        }
    }

    fn step_header(&mut self) -> Result<bool, StreamError> {
        let Some(&header_size) = self.remaining().first() else {
            return Ok(false);
        };

        if header_size != 12 && header_size != 14 {
            return Err(StreamError::UnknownHeaderLength(header_size));
        }
        if self.remaining().len() < header_size as usize {
            return Ok(false);
        }

        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct FileHeader {
            header_size: u8,
            protocol_version: u8,
            profile_version: [u8; 2],
            data_size: [u8; 4],
            data_type: [u8; 4],
        }

        let bytes: [u8; 12] = self.remaining()[..12]
            .try_into()
            .expect("length checked above");
        let FileHeader {
            protocol_version,
            data_size,
            data_type,
            ..
        } = zerocopy::transmute!(bytes);

        if &data_type != b".FIT" {
            return Err(StreamError::NotFitData);
        }
        if protocol_version >> 4 > SUPPORTED_PROTOCOL_MAJOR {
            return Err(StreamError::UnsupportedProtocol(protocol_version));
        }

        self.data_size = u32::from_le_bytes(data_size) as usize;
        self.consume(header_size as usize);
        self.phase = Phase::Records;

        Ok(true)
    }

    fn step_record(&mut self) -> Result<bool, StreamError> {
        if self.record_bytes == self.data_size {
            self.phase = Phase::Trailer;
            return Ok(true);
        }

        let Some(&header) = self.remaining().first() else {
            return Ok(false);
        };

        bitfield! {
            struct Discriminant(u8) {
                [7] is_compressed,
            }
        }

        if Discriminant(header).is_compressed() {
            bitfield! {
                struct CompressedHeader(u8) {
                    [0..5] time_offset: u8,
                    [5..7] local_message: u8,
                }
            }

            let header = CompressedHeader(header);
            self.step_data(header.local_message(), Some(header.time_offset()))
        } else {
            bitfield! {
                struct NormalHeader(u8) {
                    [0..4] local_message: u8,
                    [5] is_developer,
                    [6] is_definition,
                }
            }

            let header = NormalHeader(header);

            if header.is_developer() {
                return Err(StreamError::Developer);
            }

            if header.is_definition() {
                self.step_definition(header.local_message())
            } else {
                self.step_data(header.local_message(), None)
            }
        }
    }

    fn step_definition(&mut self, local: u8) -> Result<bool, StreamError> {
        // Layout after the header byte: reserved, architecture, global
        // message number (2), field count, then 3 bytes per field.
        let rem = self.remaining();
        if rem.len() < 6 {
            return Ok(false);
        }

        let field_count = rem[5] as usize;
        let needed = 6 + 3 * field_count;
        if rem.len() < needed {
            return Ok(false);
        }
        self.check_overrun(needed)?;

        let is_little_endian = rem[2] == 0;
        let global = [rem[3], rem[4]];
        let global = if is_little_endian {
            u16::from_le_bytes(global)
        } else {
            u16::from_be_bytes(global)
        };

        let mut fields = Vec::with_capacity(field_count);
        for chunk in rem[6..needed].chunks_exact(3) {
            element_width(chunk[2])?;
            fields.push(FieldDef {
                number: chunk[0],
                size: chunk[1],
                base_type: chunk[2],
            });
        }

        self.definitions[local as usize] = Some(Definition {
            global,
            is_little_endian,
            fields,
        });
        self.consume(needed);

        Ok(true)
    }

    fn step_data(&mut self, local: u8, time_offset: Option<u8>) -> Result<bool, StreamError> {
        let def = self.definitions[local as usize]
            .clone()
            .ok_or(StreamError::UndefinedLocalMessage(local))?;

        let body: usize = def.fields.iter().map(|f| f.size as usize).sum();
        let needed = 1 + body;

        let rem = self.remaining();
        if rem.len() < needed {
            return Ok(false);
        }
        self.check_overrun(needed)?;

        let mut fields = Vec::with_capacity(def.fields.len());
        let mut offset = 1;
        for fd in &def.fields {
            let size = fd.size as usize;
            let width = element_width(fd.base_type)?;

            if size % width == 0 {
                for element in rem[offset..offset + size].chunks_exact(width) {
                    fields.push(FieldValue {
                        number: fd.number,
                        value: decode_element(fd.base_type, element, def.is_little_endian),
                    });
                }
            } else {
                // Malformed field length; surface the bytes individually.
                for &byte in &rem[offset..offset + size] {
                    fields.push(FieldValue {
                        number: fd.number,
                        value: Value::U8(byte),
                    });
                }
            }

            offset += size;
        }

        self.queue.push_back(Message {
            global: def.global,
            time_offset,
            fields,
        });
        self.consume(needed);

        Ok(true)
    }

    fn step_trailer(&mut self) -> Result<bool, StreamError> {
        let rem = self.remaining();
        if rem.len() < 2 {
            return Ok(false);
        }

        let found = u16::from_le_bytes([rem[0], rem[1]]);
        let calculated = self.crc;
        self.pos += 2;

        if found != calculated {
            return Err(StreamError::CyclicRedundancyCheck { found, calculated });
        }

        self.phase = Phase::Complete;
        Ok(true)
    }
}

/// Bytes per element of a base type.
fn element_width(base_type: u8) -> Result<usize, StreamError> {
    Ok(match base_type {
        0x00 | 0x01 | 0x02 | 0x07 | 0x0A | 0x0D => 1,
        0x83 | 0x84 | 0x8B => 2,
        0x85 | 0x86 | 0x88 | 0x8C => 4,
        0x89 | 0x8E | 0x8F | 0x90 => 8,
        _ => return Err(StreamError::UnknownBaseType(base_type)),
    })
}

macro_rules! de {
    ($t:ty, $bytes:expr, $le:expr) => {{
        let a: [u8; size_of::<$t>()] = $bytes.try_into().expect("width checked by caller");
        if $le {
            <$t>::from_le_bytes(a)
        } else {
            <$t>::from_be_bytes(a)
        }
    }};
}

/// Decode one element of a validated base type.
fn decode_element(base_type: u8, bytes: &[u8], le: bool) -> Value {
    match base_type {
        0x01 => Value::I8(bytes[0] as i8),
        0x83 => Value::I16(de!(i16, bytes, le)),
        0x84 => Value::U16(de!(u16, bytes, le)),
        0x85 => Value::I32(de!(i32, bytes, le)),
        0x86 => Value::U32(de!(u32, bytes, le)),
        0x88 => Value::F32(de!(f32, bytes, le)),
        0x89 => Value::F64(de!(f64, bytes, le)),
        0x8B => Value::U16(de!(u16, bytes, le)),
        0x8C => Value::U32(de!(u32, bytes, le)),
        0x8E => Value::I64(de!(i64, bytes, le)),
        0x8F => Value::U64(de!(u64, bytes, le)),
        0x90 => Value::U64(de!(u64, bytes, le)),
        // 0x00, 0x02, 0x07, 0x0A, 0x0D and anything width-1.
        _ => Value::U8(bytes[0]),
    }
}

/// Accumulate a slice of bytes into a cyclic redundancy check value.
pub fn compute_crc(init: u16, r: &[u8]) -> u16 {
    r.iter().fold(init, |acc, b| crc_byte(acc, *b))
}

fn crc_byte(mut crc: u16, b: u8) -> u16 {
    const CRC_TABLE: [u16; 16] = [
        0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
        0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
    ];

    let tmp = CRC_TABLE[(crc & 0xF) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc = crc ^ tmp ^ CRC_TABLE[(b & 0xF) as usize];

    let tmp = CRC_TABLE[(crc & 0xF) as usize];
    crc = (crc >> 4) & 0x0FFF;
    crc = crc ^ tmp ^ CRC_TABLE[((b >> 4) & 0xF) as usize];

    crc
}
