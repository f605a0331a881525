//! The binary (FIT stream) source.
//!
//! [`stream`] holds the chunked push decoder for the container format;
//! [`extract`] drives it and turns the drained messages into normalized
//! records; [`profile`] lists the message and field numbers consumed.

pub mod extract;
pub mod profile;
pub mod stream;

pub use extract::decode_reader;
