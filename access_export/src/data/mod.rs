//! Row data conversion
//!
//! This module converts source values into values the targets can store.

pub mod coercion;

pub use coercion::{coerce, coerce_row, TargetValue, TIMESTAMP_FORMAT};
