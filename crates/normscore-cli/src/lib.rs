//! normscore-cli
//!
//! File-based harness around the scoring engine: loads instrument
//! definitions and responses from JSON, runs the pipeline and prints the
//! outcome. All I/O lives here; the engine crates stay pure.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod telemetry;
