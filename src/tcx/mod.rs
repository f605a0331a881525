//! The hierarchical (TCX tree) source.
//!
//! [`tree`] parses a document into the activity→lap→track→trackpoint tree
//! and computes whole-activity aggregates; [`flatten`] walks the tree into
//! normalized records, applying the near-origin data-quality filter.

pub mod flatten;
pub mod tree;

pub use flatten::flatten;
pub use tree::parse;
