//! # loggraph
//!
//! Command-line front end for `loggraph-core`: argument parsing, settings
//! file loading and result printing. All graph logic lives in the core crate.

pub mod cli;
pub mod settings;
