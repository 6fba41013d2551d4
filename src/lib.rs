//! GTT: Gauge Tracking Toolkit
//!
//! Tracks inspection gauges through their lifecycle: intake, GO/NOGO set
//! pairing, shop-floor status changes, and the calibration cycle with its
//! certificates. State lives in a SQLite database inside the project's
//! `.gtt/` directory.

pub mod cli;
pub mod core;
pub mod entities;
