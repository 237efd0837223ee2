//! Core application runner (business logic) for `bleparser`.
//!
//! This module is intentionally decoupled from CLI parsing and process exit codes
//! so it can be tested deterministically.

use crate::buffer::ReadingBuffer;
use crate::config::{Config, ConfigError};
use crate::dedup::DuplicateFilter;
use crate::output::OutputFormatter;
use crate::output::influxdb::InfluxDbFormatter;
use crate::output::json::JsonFormatter;
use crate::parser::log_decode_error;
use crate::reading::{Category, Reading};
use crate::source::Source;
use clap::{Parser, ValueEnum};
use std::io;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

/// Output line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// One JSON object per reading
    #[default]
    Json,
    /// InfluxDB line protocol
    Influxdb,
}

/// Configuration for the core run loop.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// TOML file with whitelists, AES keys and filtering options
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the `discovery` setting of the configuration file
    #[arg(long, value_name = "BOOL")]
    pub discovery: Option<bool>,

    /// Output format
    #[arg(long, default_value_t, value_enum)]
    pub format: Format,

    /// The name of the measurement in InfluxDB line protocol.
    #[arg(long, default_value = "ble_reading")]
    pub influxdb_measurement: String,

    /// Write every sensor reading immediately instead of merging readings
    /// split over several advertisements
    #[arg(long)]
    pub unbuffered: bool,

    /// Verbose output, print errors for unparsable or undecodable reports
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Options {
    fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(discovery) = self.discovery {
            config.discovery = discovery;
        }
        Ok(config)
    }

    fn formatter(&self) -> Box<dyn OutputFormatter> {
        match self.format {
            Format::Json => Box::new(JsonFormatter),
            Format::Influxdb => Box::new(InfluxDbFormatter::new(self.influxdb_measurement.clone())),
        }
    }
}

/// Errors returned by the core run loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn write_reading(
    formatter: &dyn OutputFormatter,
    reading: &Reading,
    category: Category,
    out: &mut dyn Write,
) -> io::Result<()> {
    let line = formatter.format(reading, category)?;
    writeln!(out, "{line}")
}

/// Run the core processing loop, writing formatted output to `out` and verbose errors to `err`.
///
/// - Tracker readings are written as soon as they are decoded.
/// - Sensor readings optionally pass the duplicate filter, then the reassembly
///   buffer (unless `--unbuffered`), and are written once complete.
/// - Framing and decode errors are written to `err` only when `options.verbose` is true.
pub async fn run_with_io(
    options: Options,
    source: &dyn Source,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), RunError> {
    let config = options.load_config()?;
    let parser = config.build_parser()?;
    let formatter = options.formatter();

    let mut duplicates = config.filter_duplicates.then(DuplicateFilter::new);
    let mut buffer = (!options.unbuffered).then(ReadingBuffer::new);

    info!(
        discovery = config.discovery,
        filter_duplicates = config.filter_duplicates,
        keys = config.aes_keys.len(),
        "Reading advertising reports"
    );

    let mut reports = source.start();

    while let Some(result) = reports.recv().await {
        let report = match result {
            Ok(report) => report,
            Err(report_err) => {
                if options.verbose {
                    writeln!(err, "{report_err}")?;
                }
                continue;
            }
        };

        let (sensor, tracker) = match parser.decode(&report) {
            Ok(readings) => readings,
            Err(decode_err) => {
                log_decode_error(&report, &decode_err);
                if options.verbose {
                    writeln!(err, "{}: {decode_err}", report.address)?;
                }
                continue;
            }
        };

        if let Some(tracker) = tracker {
            write_reading(formatter.as_ref(), &tracker, Category::Tracker, out)?;
        }

        let Some(sensor) = sensor else {
            continue;
        };
        if duplicates.as_mut().is_some_and(|d| d.is_duplicate(&sensor)) {
            continue;
        }
        let complete = match buffer.as_mut() {
            Some(buffer) => buffer.push(sensor),
            None => Some(sensor),
        };
        if let Some(reading) = complete {
            write_reading(formatter.as_ref(), &reading, Category::Sensor, out)?;
        }
    }

    Ok(())
}
