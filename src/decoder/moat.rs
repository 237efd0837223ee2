//! Moat S2 temperature/humidity sensor (service data UUID 0x1000).

use super::DecodeResult;
use crate::reading::Decoded;

pub const UUID: u16 = 0x1000;

/// Service data length after the UUID
const PAYLOAD_LENGTH: usize = 18;

fn read_u16(payload: &[u8], offset: usize) -> f64 {
    f64::from(u16::from_le_bytes([payload[offset], payload[offset + 1]]))
}

/// Battery percentage from the cell voltage, linear between 2.76 V and 2.82 V.
fn battery_percentage(volt: f64) -> f64 {
    if volt >= 2.82 {
        100.0
    } else if volt > 2.76 {
        (volt - 2.76) / 0.06 * 100.0
    } else {
        0.0
    }
}

pub fn decode(payload: &[u8]) -> DecodeResult {
    if payload.len() != PAYLOAD_LENGTH {
        return Ok(None);
    }

    let temperature = -46.85 + 175.72 * read_u16(payload, 10) / 65536.0;
    let humidity = -6.0 + 125.0 * read_u16(payload, 12) / 65536.0;
    let voltage = read_u16(payload, 14) / 1000.0;

    let mut decoded = Decoded::new("Moat", "Moat S2");
    decoded.insert_rounded("temperature", temperature, 2);
    decoded.insert_rounded("humidity", humidity, 2);
    decoded.insert_rounded("voltage", voltage, 3);
    decoded.insert_rounded("battery", battery_percentage(voltage), 1);
    Ok(Some(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{MetricValue, PacketId};

    fn payload(temp: u16, humi: u16, volt: u16) -> Vec<u8> {
        let mut payload = vec![0u8; 10];
        payload.extend_from_slice(&temp.to_le_bytes());
        payload.extend_from_slice(&humi.to_le_bytes());
        payload.extend_from_slice(&volt.to_le_bytes());
        payload.extend_from_slice(&[0, 0]);
        payload
    }

    #[test]
    fn test_decode_moat_s2() {
        let decoded = decode(&payload(0x6666, 0x8000, 2790)).unwrap().unwrap();
        assert_eq!(decoded.firmware, "Moat");
        assert_eq!(decoded.device_type, "Moat S2");
        assert_eq!(decoded.packet, PacketId::None);
        assert_eq!(decoded.metrics["temperature"], MetricValue::Float(23.44));
        assert_eq!(decoded.metrics["humidity"], MetricValue::Float(56.5));
        assert_eq!(decoded.metrics["voltage"], MetricValue::Float(2.79));
        assert_eq!(decoded.metrics["battery"], MetricValue::Int(50));
    }

    #[test]
    fn test_battery_bounds() {
        let full = decode(&payload(0, 0, 2900)).unwrap().unwrap();
        assert_eq!(full.metrics["battery"], MetricValue::Int(100));

        let empty = decode(&payload(0, 0, 2500)).unwrap().unwrap();
        assert_eq!(empty.metrics["battery"], MetricValue::Int(0));
    }

    #[test]
    fn test_other_lengths_are_unknown_devices() {
        assert_eq!(decode(&[0u8; 12]), Ok(None));
        assert_eq!(decode(&[]), Ok(None));
    }
}
