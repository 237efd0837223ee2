//! Apple iBeacon frames (manufacturer id 0x004C), published as trackers.

use super::DecodeResult;
use crate::reading::{Decoded, MetricValue};

pub const MANUFACTURER_ID: u16 = 0x004C;

/// Beacon type and remaining length that prefix every iBeacon frame
const IBEACON_PREFIX: [u8; 2] = [0x02, 0x15];
/// Some vendors append bytes after the measured power
const MIN_PAYLOAD_LENGTH: usize = 23;

fn format_uuid(bytes: &[u8]) -> String {
    let hex = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Other Apple manufacturer data (AirDrop, Handoff, ...) is an unknown device.
pub fn decode(payload: &[u8]) -> DecodeResult {
    if payload.len() < MIN_PAYLOAD_LENGTH || payload[..2] != IBEACON_PREFIX {
        return Ok(None);
    }

    let major = u16::from_be_bytes([payload[18], payload[19]]);
    let minor = u16::from_be_bytes([payload[20], payload[21]]);
    let measured_power = payload[22] as i8;

    let mut decoded = Decoded::new("iBeacon", "iBeacon");
    decoded.insert("uuid", MetricValue::Text(format_uuid(&payload[2..18])));
    decoded.insert("major", MetricValue::Int(i64::from(major)));
    decoded.insert("minor", MetricValue::Int(i64::from(minor)));
    decoded.insert("measured_power", MetricValue::Int(i64::from(measured_power)));
    Ok(Some(decoded))
}
