//! Jaalee JHT temperature/humidity sensor.
//!
//! The sensor sends its readings twice: inside an iBeacon frame with a fixed
//! UUID, and in service data (UUID 0xF525) that also carries the device
//! address. Dispatch routes the pair to the service data.

use super::{DecodeError, DecodeResult};
use crate::mac_address::MacAddress;
use crate::reading::{Decoded, MetricValue};

pub const UUID: u16 = 0xF525;

/// iBeacon proximity UUID `ebefd083-70a2-47c8-9837-e7b5634df525`.
pub const BEACON_UUID: [u8; 16] = [
    0xEB, 0xEF, 0xD0, 0x83, 0x70, 0xA2, 0x47, 0xC8, 0x98, 0x37, 0xE7, 0xB5, 0x63, 0x4D, 0xF5, 0x25,
];

/// battery, address (little endian), temperature, humidity
const PAYLOAD_LENGTH: usize = 11;

/// Whether Apple manufacturer data is a Jaalee iBeacon frame.
pub fn is_beacon_frame(payload: &[u8]) -> bool {
    payload.len() >= 18 && payload[..2] == [0x02, 0x15] && payload[2..18] == BEACON_UUID
}

/// Two decimals, truncated towards negative infinity.
fn truncated(value: f64) -> MetricValue {
    MetricValue::from_scaled((value * 100.0).floor() / 100.0)
}

pub fn decode(payload: &[u8]) -> DecodeResult {
    if payload.len() != PAYLOAD_LENGTH {
        return Err(DecodeError::InvalidData(format!(
            "Jaalee payload must be {PAYLOAD_LENGTH} bytes, got {}",
            payload.len()
        )));
    }

    let mut address = [0u8; 6];
    address.copy_from_slice(&payload[1..7]);
    address.reverse();

    let temperature = f64::from(u16::from_be_bytes([payload[7], payload[8]]));
    let humidity = f64::from(u16::from_be_bytes([payload[9], payload[10]]));

    let mut decoded = Decoded::new("Jaalee", "JHT");
    decoded.insert("temperature", truncated(-46.85 + 175.72 * temperature / 65536.0));
    decoded.insert("humidity", truncated(-6.0 + 125.0 * humidity / 65536.0));
    decoded.insert("battery", MetricValue::Int(i64::from(payload[0])));
    decoded.address = Some(MacAddress(address));
    Ok(Some(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = "60138581ff9fd04f105a3e";

    #[test]
    fn test_decode_jht() {
        let decoded = decode(&hex::decode(PAYLOAD).unwrap()).unwrap().unwrap();
        assert_eq!(decoded.firmware, "Jaalee");
        assert_eq!(decoded.device_type, "JHT");
        assert_eq!(decoded.metrics["temperature"], MetricValue::Float(7.41));
        assert_eq!(decoded.metrics["humidity"], MetricValue::Float(38.06));
        assert_eq!(decoded.metrics["battery"], MetricValue::Int(96));
        assert_eq!(
            decoded.address,
            Some(MacAddress([0xD0, 0x9F, 0xFF, 0x81, 0x85, 0x13]))
        );
    }

    #[test]
    fn test_negative_temperature_truncates_down() {
        // 0x3000: -46.85 + 175.72 * 12288 / 65536 = -13.9025
        let decoded = decode(&hex::decode("64138581ff9fd030005a3e").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(decoded.metrics["temperature"], MetricValue::Float(-13.91));
    }

    #[test]
    fn test_wrong_length() {
        assert!(matches!(decode(&[0x60, 0x13]), Err(DecodeError::InvalidData(_))));
    }

    #[test]
    fn test_beacon_frame() {
        let frame = hex::decode("0215ebefd08370a247c89837e7b5634df5254f105a3ecb60").unwrap();
        assert!(is_beacon_frame(&frame));
        assert!(is_beacon_frame(&frame[..23]));
        assert!(!is_beacon_frame(&frame[..17]));

        let mut other = frame.clone();
        other[2] = 0x00;
        assert!(!is_beacon_frame(&other));
    }
}
