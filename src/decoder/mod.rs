//! Vendor decode strategies.
//!
//! Every supported advertisement format is one variant of the closed
//! [`Vendor`] enum. [`dispatch`] picks the variant from the AD elements, and
//! [`decode`] runs the matching strategy on the selected payload. Adding a
//! vendor means adding a table entry, a variant and a module.

pub mod almendo;
pub mod bthome;
pub mod dispatch;
pub mod ibeacon;
pub mod jaalee;
pub mod moat;
pub mod ruuvi;

use crate::crypto::{DecryptionError, EncryptionKeys};
use crate::mac_address::MacAddress;
use crate::reading::{Category, Decoded};
use std::fmt;
use thiserror::Error;

/// Error types for decoding a selected vendor payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Known vendor, but a format version we do not decode
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    /// Invalid or corrupted data that cannot be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Decoder library returned an error
    #[error("Decoder error: {0}")]
    DecoderError(String),
    /// Encrypted payload could not be authenticated; nothing is surfaced
    #[error("Decryption error: {0}")]
    Decryption(#[from] DecryptionError),
}

/// `Ok(None)` means the vendor is known but this particular device is not.
pub type DecodeResult = Result<Option<Decoded>, DecodeError>;

/// Label matched against the `report_unknown` setting for adverts no vendor
/// claims.
pub const OTHER_LABEL: &str = "Other";

/// Supported advertisement formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vendor {
    BtHomeV1,
    BtHomeV1Encrypted,
    BtHomeV2,
    Moat,
    Almendo,
    Jaalee,
    Ruuvi,
    IBeacon,
}

impl Vendor {
    /// Output stream the vendor's readings go to.
    pub fn category(&self) -> Category {
        match self {
            Vendor::IBeacon => Category::Tracker,
            _ => Category::Sensor,
        }
    }

    /// Vendor family name, as accepted by `report_unknown`.
    pub fn label(&self) -> &'static str {
        match self {
            Vendor::BtHomeV1 | Vendor::BtHomeV1Encrypted | Vendor::BtHomeV2 => "BTHome",
            Vendor::Moat => "Moat",
            Vendor::Almendo => "Almendo",
            Vendor::Jaalee => "Jaalee",
            Vendor::Ruuvi => "Ruuvitag",
            Vendor::IBeacon => "iBeacon",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::BtHomeV1 => write!(f, "BTHome V1"),
            Vendor::BtHomeV1Encrypted => write!(f, "BTHome V1 (encrypted)"),
            Vendor::BtHomeV2 => write!(f, "BTHome V2"),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Read-only inputs shared by every strategy.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub address: MacAddress,
    pub keys: &'a EncryptionKeys,
}

/// Run the strategy of `vendor` on its selected payload.
pub fn decode(vendor: Vendor, payload: &[u8], ctx: &DecodeContext<'_>) -> DecodeResult {
    match vendor {
        Vendor::BtHomeV1 => bthome::decode_v1(payload),
        Vendor::BtHomeV1Encrypted => bthome::decode_v1_encrypted(payload, ctx),
        Vendor::BtHomeV2 => bthome::decode_v2(payload, ctx),
        Vendor::Moat => moat::decode(payload),
        Vendor::Almendo => almendo::decode(payload),
        Vendor::Jaalee => jaalee::decode(payload),
        Vendor::Ruuvi => ruuvi::decode(payload),
        Vendor::IBeacon => ibeacon::decode(payload),
    }
}
