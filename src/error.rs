//! Errors terminating a decode.

use thiserror::Error;

/// Which pre-sized output array overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Sample,
    Lap,
}

impl core::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Sample => write!(f, "sample"),
            Self::Lap => write!(f, "lap"),
        }
    }
}

/// Errors occurring while decoding an activity file.
///
/// Every variant is terminal for the whole decode call: no partial results
/// are surfaced, and no retry is attempted at this layer.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The source file could not be opened or read.
    #[error("Could not open source file: {0}.")]
    OpenFailed(#[from] std::io::Error),
    /// Structural or checksum failure in the binary protocol stream.
    #[error("Malformed binary stream: {0}.")]
    MalformedStream(String),
    /// The file does not carry the expected binary header marker.
    #[error("File is not FIT data.")]
    UnsupportedFormat,
    /// The stream's protocol version is outside the supported range.
    #[error("Unsupported protocol version ({0}).")]
    UnsupportedVersion(u8),
    /// The source ended while the decoder still expected bytes.
    #[error("Unexpected end of stream mid-message.")]
    TruncatedStream,
    /// An output array filled before the source was exhausted.
    #[error("Too many {kind} records for capacity {capacity}.")]
    CapacityExceeded { kind: RecordKind, capacity: usize },
    /// The XML tree source failed to parse the document.
    #[error("Could not parse activity tree: {0}.")]
    TreeParseFailed(String),
}
