//! Output formatters for decoded readings.
//!
//! Each reading is written as one line, either as JSON or as InfluxDB line
//! protocol.

pub mod influxdb;
pub mod json;

use crate::reading::{Category, Reading};
use std::io;

/// Trait for formatting readings into output lines.
pub trait OutputFormatter: Send + Sync {
    /// Format a reading of the given category as a single line (without the
    /// trailing newline).
    fn format(&self, reading: &Reading, category: Category) -> io::Result<String>;
}
