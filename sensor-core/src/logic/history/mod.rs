//! History Module - durable record of accepted decisions
//!
//! A CSV file with header `Timestamp,Temperature,Humidity,Gas,Anomaly`.
//! Consecutive duplicate decisions are collapsed into one row.

pub mod entry;
pub mod append;

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

pub use entry::{header, LogEntry};
pub use append::{AppendLog, AppendOutcome, LogError};
