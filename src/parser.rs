//! Advertisement-to-reading pipeline.
//!
//! [`BleParser`] holds only read-only configuration (admission policy, AES
//! keys, unknown-device reporting), so one instance can be shared across
//! threads and decode reports concurrently.

use crate::crypto::EncryptionKeys;
use crate::decoder::{self, DecodeContext, DecodeError, OTHER_LABEL, Vendor, dispatch};
use crate::policy::{Admission, Policy};
use crate::reading::{Reading, normalize};
use crate::report::AdvertisingReport;
use tracing::{debug, info, warn};

/// Sensor reading on the left, tracker reading on the right. At most one
/// side is populated.
pub type ParseResult = (Option<Reading>, Option<Reading>);

#[derive(Debug, Clone, Default)]
pub struct BleParser {
    policy: Policy,
    keys: EncryptionKeys,
    report_unknown: Option<String>,
}

impl BleParser {
    pub fn new(policy: Policy, keys: EncryptionKeys) -> Self {
        Self {
            policy,
            keys,
            report_unknown: None,
        }
    }

    /// Log adverts of unrecognised devices of one vendor family at info level.
    /// `"Other"` selects adverts that no vendor claims.
    pub fn with_report_unknown(mut self, label: impl Into<String>) -> Self {
        self.report_unknown = Some(label.into());
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    fn reports_unknown(&self, label: &str) -> bool {
        self.report_unknown.as_deref() == Some(label)
    }

    /// Decode one advertising report.
    ///
    /// Rejected devices and unknown adverts yield `(None, None)`; only a
    /// failing strategy (bad format, failed decryption) is an error.
    pub fn decode(&self, report: &AdvertisingReport) -> Result<ParseResult, DecodeError> {
        let Some(selection) = dispatch::select(report.elements()) else {
            if self.reports_unknown(OTHER_LABEL) {
                info!(
                    mac = %report.address,
                    rssi = report.rssi,
                    adv = %hex::encode_upper(&report.payload),
                    "BLE advertisement from unknown device"
                );
            }
            return Ok((None, None));
        };

        let vendor = selection.vendor;
        let category = vendor.category();
        if self.policy.admit(&report.address, category) == Admission::Reject {
            debug!(mac = %report.address, %category, %vendor, "Device not whitelisted");
            return Ok((None, None));
        }

        let ctx = DecodeContext {
            address: report.address,
            keys: &self.keys,
        };
        let Some(decoded) = decoder::decode(vendor, selection.payload, &ctx)? else {
            self.log_unknown_device(report, vendor);
            return Ok((None, None));
        };

        let address = decoded.address.unwrap_or(report.address);
        if address != report.address
            && self.policy.admit(&address, category) == Admission::Reject
        {
            debug!(mac = %address, %category, %vendor, "Embedded address not whitelisted");
            return Ok((None, None));
        }

        Ok(normalize(address, report.rssi, category, decoded))
    }

    /// Like [`decode`](Self::decode), with errors logged instead of returned.
    pub fn parse_report(&self, report: &AdvertisingReport) -> ParseResult {
        match self.decode(report) {
            Ok(result) => result,
            Err(e) => {
                log_decode_error(report, &e);
                (None, None)
            }
        }
    }

    /// Decode a raw HCI LE advertising report event.
    pub fn parse_raw_data(&self, data: &[u8]) -> ParseResult {
        match AdvertisingReport::from_hci_event(data) {
            Ok(report) => self.parse_report(&report),
            Err(e) => {
                debug!(error = %e, "Ignoring malformed HCI event");
                (None, None)
            }
        }
    }

    fn log_unknown_device(&self, report: &AdvertisingReport, vendor: Vendor) {
        if self.reports_unknown(vendor.label()) {
            info!(
                mac = %report.address,
                rssi = report.rssi,
                %vendor,
                adv = %hex::encode_upper(&report.payload),
                "Unknown device of a supported vendor"
            );
        }
    }
}

/// Decryption failures are warnings; everything else only matters when
/// debugging.
pub fn log_decode_error(report: &AdvertisingReport, error: &DecodeError) {
    match error {
        DecodeError::Decryption(e) => {
            warn!(mac = %report.address, error = %e, "Failed to decrypt advertisement")
        }
        e => debug!(mac = %report.address, error = %e, "Failed to decode advertisement"),
    }
}
