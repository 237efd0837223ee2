//! Almendo bluSensor air quality sensors (manufacturer id 0x06E8).

use super::DecodeResult;
use crate::reading::{Decoded, MetricValue};

pub const MANUFACTURER_ID: u16 = 0x06E8;

const PAYLOAD_LENGTH: usize = 16;
const PROTOCOL_V1: u8 = 0x01;
const BLUSENSOR_MINI: u8 = 0x0A;

pub fn decode(payload: &[u8]) -> DecodeResult {
    if payload.len() != PAYLOAD_LENGTH || payload[0] != PROTOCOL_V1 {
        return Ok(None);
    }
    let device_type = match payload[1] {
        BLUSENSOR_MINI => "bluSensor Mini",
        _ => return Ok(None),
    };

    let temperature = i16::from_le_bytes([payload[7], payload[8]]);
    let humidity = u16::from_le_bytes([payload[9], payload[10]]);
    let co2 = u16::from_le_bytes([payload[11], payload[12]]);
    let tvoc = u16::from_le_bytes([payload[13], payload[14]]);

    let mut decoded = Decoded::new("Almendo V1", device_type);
    decoded.insert_rounded("temperature", f64::from(temperature) / 100.0, 2);
    decoded.insert_rounded("humidity", f64::from(humidity) / 100.0, 2);
    decoded.insert("co2", MetricValue::Int(i64::from(co2)));
    decoded.insert("tvoc", MetricValue::Int(i64::from(tvoc)));
    decoded.insert("aqi", MetricValue::Int(i64::from(payload[15])));
    Ok(Some(decoded))
}
