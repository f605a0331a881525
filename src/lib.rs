//! Normalizes fitness-activity files into unit-aware plot records.
//!
//! Musette ingests two heterogeneous source formats — the chunked FIT
//! binary stream and the hierarchical TCX activity tree — and flattens both
//! into a single set of normalized, SI-unit records: per-sample time
//! series, per-lap summaries, and one whole-activity session summary.
//! Display values (metric or English units, local times, pace rendering)
//! are projected from the store on demand by the [`project`] module.
//!
//! A decode is synchronous, all-or-nothing, and carries no state between
//! invocations: every call builds a fresh [`RecordStore`] and hands it to
//! the caller by value, or fails with a single [`DecodeError`].

pub mod convert;
pub mod error;
pub mod fit;
pub mod project;
pub mod record;
pub mod sentinel;
pub mod store;
pub mod tcx;

use std::fs::File;
use std::path::Path;

use tracing::debug;

pub use error::{DecodeError, RecordKind};
pub use project::{PlotKind, UnitSystem};
pub use record::{LapRecord, SampleRecord, SessionSummary};
pub use store::{Extent, RecordStore};

/// Declared sizes of the pre-sized output arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacities {
    pub samples: usize,
    pub laps: usize,
}

impl Default for Capacities {
    /// Generous for multi-hour activities sampled every few seconds.
    fn default() -> Self {
        Self {
            samples: 2880,
            laps: 400,
        }
    }
}

/// Decode one activity file into a fresh record store.
///
/// The source format is selected by file extension: `fit` takes the binary
/// stream path, `tcx` (or `xml`) the tree path. Any failure is terminal
/// and surfaces no partial results.
pub fn decode_file(
    path: impl AsRef<Path>,
    capacities: Capacities,
) -> Result<RecordStore, DecodeError> {
    let path = path.as_ref();
    let mut store = RecordStore::new(capacities.samples, capacities.laps);

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    debug!(?path, ?extension, "decoding activity file");

    match extension.as_deref() {
        Some("fit") => {
            let mut file = File::open(path)?;
            fit::decode_reader(&mut file, &mut store)?;
        }
        Some("tcx" | "xml") => {
            let document = std::fs::read_to_string(path)?;
            let tree =
                tcx::parse(&document).map_err(|e| DecodeError::TreeParseFailed(e.to_string()))?;
            tcx::flatten(&tree, &mut store)?;
        }
        _ => return Err(DecodeError::UnsupportedFormat),
    }

    Ok(store)
}
