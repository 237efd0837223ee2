//! Advertising reports and HCI event framing.
//!
//! A scanning backend hands us either a raw HCI LE Meta event or an already
//! unpacked (payload, address, RSSI) triple. Both end up as an
//! [`AdvertisingReport`], the single input of the decode pipeline.

use crate::ad::AdElements;
use crate::mac_address::MacAddress;
use thiserror::Error;

// HCI packet types
pub const HCI_EVENT_PKT: u8 = 0x04;

// HCI events
pub const EVT_LE_META_EVENT: u8 = 0x3E;

// LE Meta event sub-events
pub const EVT_LE_ADVERTISING_REPORT: u8 = 0x02;

/// Packet type + event code + parameter length + sub-event + report count.
const HCI_HEADER_LEN: usize = 5;

/// Event type + address type + address + data length.
const REPORT_HEADER_LEN: usize = 9;

/// Errors raised while unpacking an HCI advertising event.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    #[error("HCI event too short: {0} bytes")]
    TooShort(usize),
    #[error("not an LE advertising report (packet type {packet_type:#04x}, event {event:#04x}, sub-event {subevent:#04x})")]
    NotAdvertisingReport {
        packet_type: u8,
        event: u8,
        subevent: u8,
    },
    #[error("HCI parameter length {declared} does not match {actual} bytes received")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("advertising data length {declared} exceeds the {available} bytes left in the event")]
    Truncated { declared: usize, available: usize },
    #[error("invalid hex input: {0}")]
    InvalidHex(String),
}

/// One received advertisement: AD payload, source address and signal strength.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvertisingReport {
    pub address: MacAddress,
    pub rssi: i8,
    pub payload: Vec<u8>,
}

impl AdvertisingReport {
    pub fn new(address: MacAddress, rssi: i8, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            address,
            rssi,
            payload: payload.into(),
        }
    }

    /// Unpack an HCI LE Advertising Report event.
    ///
    /// Layout: `04 3E <len> 02 <num reports> <event type> <address type>
    /// <address, 6 bytes LE> <data len> <data...> <rssi>`. Only the first report
    /// of the event is used.
    pub fn from_hci_event(data: &[u8]) -> Result<Self, ReportError> {
        if data.len() < HCI_HEADER_LEN + REPORT_HEADER_LEN + 1 {
            return Err(ReportError::TooShort(data.len()));
        }

        if data[0] != HCI_EVENT_PKT
            || data[1] != EVT_LE_META_EVENT
            || data[3] != EVT_LE_ADVERTISING_REPORT
        {
            return Err(ReportError::NotAdvertisingReport {
                packet_type: data[0],
                event: data[1],
                subevent: data[3],
            });
        }

        let declared = data[2] as usize;
        if declared != data.len() - 3 {
            return Err(ReportError::LengthMismatch {
                declared,
                actual: data.len() - 3,
            });
        }

        // Skip HCI header, then event type and address type
        let report = &data[HCI_HEADER_LEN..];
        let mut addr = [0u8; 6];
        addr.copy_from_slice(&report[2..8]);

        let data_len = report[8] as usize;
        let available = report.len() - REPORT_HEADER_LEN;
        // The RSSI byte follows the advertising data
        if data_len + 1 > available {
            return Err(ReportError::Truncated {
                declared: data_len,
                available,
            });
        }

        let payload = &report[REPORT_HEADER_LEN..REPORT_HEADER_LEN + data_len];
        let rssi = report[REPORT_HEADER_LEN + data_len] as i8;

        Ok(Self::new(MacAddress::from_le_bytes(addr), rssi, payload))
    }

    /// Parse a hex-encoded HCI event, as produced by `hcidump --raw` style tools.
    pub fn from_hex(line: &str) -> Result<Self, ReportError> {
        let compact: String = line.split_whitespace().collect();
        let bytes = hex::decode(&compact).map_err(|e| ReportError::InvalidHex(e.to_string()))?;
        Self::from_hci_event(&bytes)
    }

    /// Lazily split the payload into AD elements.
    pub fn elements(&self) -> AdElements<'_> {
        AdElements::new(&self.payload)
    }
}
