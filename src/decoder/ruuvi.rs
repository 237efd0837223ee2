//! RuuviTag manufacturer data (id 0x0499), data formats 5 and 6.
//!
//! The byte layout is handled by `ruuvi-decoders`; this module maps its
//! output onto metric names and output units.

use super::{DecodeError, DecodeResult};
use crate::mac_address::MacAddress;
use crate::reading::{Decoded, MetricValue, PacketId};
use ruuvi_decoders::{v5, v6};

pub const MANUFACTURER_ID: u16 = 0x0499;

const DEVICE_TYPE: &str = "Ruuvitag";

/// Format 5 carries the tag's own MAC at these offsets
const V5_MAC_RANGE: std::ops::Range<usize> = 18..24;

/// Decode manufacturer data (without the company id) from a RuuviTag.
///
/// # Unit Conversions
/// - Pressure: Pa (V5) or hPa (V6) → mbar
/// - Battery voltage: millivolts → Volts (divide by 1000)
pub fn decode(data: &[u8]) -> DecodeResult {
    if data.is_empty() {
        return Err(DecodeError::InvalidData("Empty data".into()));
    }

    match data[0] {
        5 => decode_v5(data),
        6 => decode_v6(data),
        _ => Err(DecodeError::UnsupportedFormat(format!(
            "RuuviTag data format {} (only V5 and V6 supported)",
            data[0]
        ))),
    }
}

/// MAC embedded in a V5 frame; all-ones means the tag did not fill it in.
fn embedded_mac(data: &[u8]) -> Option<MacAddress> {
    let bytes: [u8; 6] = data.get(V5_MAC_RANGE)?.try_into().ok()?;
    (bytes != [0xFF; 6]).then_some(MacAddress(bytes))
}

fn insert_count(decoded: &mut Decoded, name: &str, value: Option<f64>) {
    if let Some(value) = value {
        decoded.insert(name, MetricValue::from_scaled(value));
    }
}

fn decode_v5(data: &[u8]) -> DecodeResult {
    match v5::decode(data) {
        Ok(tag) => {
            let mut decoded = Decoded::new("Ruuvitag V5", DEVICE_TYPE);
            if let Some(t) = tag.temperature {
                decoded.insert_rounded("temperature", t, 2);
            }
            if let Some(h) = tag.humidity {
                decoded.insert_rounded("humidity", h, 2);
            }
            if let Some(pa) = tag.pressure {
                decoded.insert_rounded("pressure", pa / 100.0, 2);
            }
            if let Some(mv) = tag.battery_voltage {
                decoded.insert_rounded("voltage", f64::from(mv) / 1000.0, 3);
            }
            insert_count(&mut decoded, "tx_power", tag.tx_power.map(f64::from));
            insert_count(
                &mut decoded,
                "movement_counter",
                tag.movement_counter.map(f64::from),
            );

            if let (Some(x), Some(y), Some(z)) =
                (tag.acceleration_x, tag.acceleration_y, tag.acceleration_z)
            {
                let (x, y, z) = (f64::from(x), f64::from(y), f64::from(z));
                decoded.insert("acceleration_x", MetricValue::from_scaled(x));
                decoded.insert("acceleration_y", MetricValue::from_scaled(y));
                decoded.insert("acceleration_z", MetricValue::from_scaled(z));
                decoded.insert_rounded("acceleration", (x * x + y * y + z * z).sqrt(), 2);
            }

            if let Some(seq) = tag.measurement_sequence {
                decoded.packet = PacketId::Id(u32::from(seq));
            }
            decoded.address = embedded_mac(data);
            Ok(Some(decoded))
        }
        Err(e) => Err(DecodeError::DecoderError(format!(
            "Failed to decode RuuviTag data: {e:?}"
        ))),
    }
}

fn decode_v6(data: &[u8]) -> DecodeResult {
    match v6::decode(data) {
        Ok(tag) => {
            let mut decoded = Decoded::new("Ruuvitag V6", DEVICE_TYPE);
            if let Some(t) = tag.temperature {
                decoded.insert_rounded("temperature", t, 2);
            }
            if let Some(h) = tag.humidity {
                decoded.insert_rounded("humidity", h, 2);
            }
            // Decoder returns hPa, which is already mbar
            if let Some(hpa) = tag.pressure {
                decoded.insert_rounded("pressure", hpa, 2);
            }
            if let Some(pm) = tag.pm2_5 {
                decoded.insert_rounded("pm2.5", pm, 1);
            }
            insert_count(&mut decoded, "co2", tag.co2.map(f64::from));
            insert_count(&mut decoded, "voc_index", tag.voc_index.map(f64::from));
            insert_count(&mut decoded, "nox_index", tag.nox_index.map(f64::from));
            if let Some(lux) = tag.luminosity {
                decoded.insert_rounded("illuminance", lux, 2);
            }
            if let Some(seq) = tag.measurement_sequence {
                decoded.packet = PacketId::Id(u32::from(seq));
            }
            Ok(Some(decoded))
        }
        Err(e) => Err(DecodeError::DecoderError(format!(
            "Failed to decode RuuviTag data: {e:?}"
        ))),
    }
}
