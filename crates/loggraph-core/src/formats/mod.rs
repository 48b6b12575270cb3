//! # Formats Module
//!
//! Binary wire format for graph records.
//!
//! File I/O lives in [`crate::corpus`]; this module only turns bytes into
//! graphs and back.

mod persistence;

pub use persistence::*;
