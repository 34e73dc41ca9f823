//! Frame Module - Inbound line decoding
//!
//! One line of the device stream is one JSON object. Decoding is keyed,
//! never positional, and has no side effects.

pub mod schema;
pub mod decoder;

#[cfg(test)]
mod tests;

pub use decoder::{decode, DecodeError, DecodeErrorKind, FrameDecoder};
pub use schema::{FieldKind, FrameSchema, FIELD_KINDS};
