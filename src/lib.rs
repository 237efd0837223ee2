//! `bleparser` library.
//!
//! Turns raw BLE advertising reports into normalized sensor and tracker
//! readings. [`BleParser`] is the entry point for library users; it is
//! immutable once built and can be shared across threads.
//!
//! The binary (`src/main.rs`) is responsible for CLI parsing, logging setup and
//! process exit codes. The run loop lives in [`crate::app`] where it can be
//! tested deterministically with an injected source and injected output
//! streams.

pub mod ad;
pub mod app;
pub mod buffer;
pub mod config;
pub mod crypto;
pub mod decoder;
pub mod dedup;
pub mod mac_address;
pub mod output;
pub mod parser;
pub mod policy;
pub mod reading;
pub mod report;
pub mod schema;
pub mod source;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types at the crate root
pub use buffer::ReadingBuffer;
pub use config::{Config, ConfigError};
pub use crypto::{DecryptionError, EncryptionKeys};
pub use decoder::{DecodeError, Vendor};
pub use dedup::DuplicateFilter;
pub use mac_address::MacAddress;
pub use output::OutputFormatter;
pub use output::influxdb::InfluxDbFormatter;
pub use output::json::JsonFormatter;
pub use parser::{BleParser, ParseResult};
pub use policy::Policy;
pub use reading::{Category, MetricValue, PacketId, Reading};
pub use report::{AdvertisingReport, ReportError};
pub use source::{ReportResult, Source, StdinSource};
