//! BTHome service data, protocol versions 1 and 2.
//!
//! V1 (UUID 0x181C, encrypted 0x181E) prefixes each object with a control
//! byte carrying its length and number format, so unknown ids can be skipped.
//! V2 (UUID 0xFCD2) starts with a device info byte and lays objects out back
//! to back; their length is only known from the measurement table, so the walk
//! stops at the first unknown id.

use super::{DecodeContext, DecodeError, DecodeResult};
use crate::crypto::{self, NonceLayout};
use crate::reading::{Decoded, MetricValue, Metrics, PacketId};
use crate::schema::{self, MeasurementType, NumberFormat, PACKET_ID};
use tracing::debug;

pub const UUID_V1: u16 = 0x181C;
pub const UUID_V1_ENCRYPTED: u16 = 0x181E;
pub const UUID_V2: u16 = 0xFCD2;

const DEVICE_TYPE: &str = "BTHome";

/// Device info byte flags (V2)
const FLAG_ENCRYPTED: u8 = 0x01;
const FLAG_TRIGGER_BASED: u8 = 0x04;
const VERSION_SHIFT: u8 = 5;

/// Objects decoded from one payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Objects {
    pub metrics: Metrics,
    pub packet: PacketId,
}

impl Objects {
    fn store(&mut self, measurement: &MeasurementType, raw: i64) {
        if measurement.object_id == PACKET_ID {
            self.packet = PacketId::Id(raw as u32);
        } else if measurement.binary {
            self.metrics
                .insert(measurement.name.to_string(), MetricValue::Bool(raw != 0));
        } else {
            self.metrics.insert(
                measurement.name.to_string(),
                MetricValue::from_scaled(measurement.scale(raw)),
            );
        }
    }

    fn into_decoded(self, firmware: &str, counter: Option<u32>) -> Decoded {
        let mut decoded = Decoded::new(firmware, DEVICE_TYPE);
        decoded.metrics = self.metrics;
        decoded.packet = match (self.packet, counter) {
            (PacketId::Id(id), _) => PacketId::Id(id),
            (PacketId::None, Some(counter)) => PacketId::Id(counter),
            (PacketId::None, None) => PacketId::None,
        };
        decoded
    }
}

/// Little-endian integer of 1 to 8 bytes.
fn read_int(raw: &[u8], format: NumberFormat) -> i64 {
    let mut buf = [0u8; 8];
    buf[..raw.len()].copy_from_slice(raw);
    let value = u64::from_le_bytes(buf);
    match format {
        NumberFormat::Unsigned => value as i64,
        NumberFormat::Signed => {
            let shift = 64 - 8 * raw.len() as u32;
            ((value << shift) as i64) >> shift
        }
    }
}

/// Walk back-to-back V2 objects.
///
/// An unknown object id or a truncated value ends the walk; everything decoded
/// before that point is kept.
pub fn decode_objects(data: &[u8]) -> Objects {
    let mut objects = Objects::default();
    let mut offset = 0;

    while let Some(&object_id) = data.get(offset) {
        let Some(measurement) = schema::lookup(object_id) else {
            debug!(object_id, offset, "Unknown BTHome object id, skipping rest");
            break;
        };
        let start = offset + 1;
        let end = start + measurement.data_length;
        let Some(raw) = data.get(start..end) else {
            debug!(object_id, offset, "Truncated BTHome object");
            break;
        };
        objects.store(measurement, read_int(raw, measurement.format));
        offset = end;
    }

    objects
}

/// Walk V1 objects, each prefixed with a control byte.
///
/// Control byte: bits 0-4 hold the length of id plus value, bits 5-7 the
/// number format. Objects with an unknown id or a float/string format are
/// skipped.
pub fn decode_v1_objects(data: &[u8]) -> Objects {
    let mut objects = Objects::default();
    let mut offset = 0;

    while let Some(&control) = data.get(offset) {
        let length = usize::from(control & 0x1F);
        let next = offset + 1 + length;
        if next > data.len() {
            debug!(offset, length, "Truncated BTHome V1 object");
            break;
        }
        if length < 2 {
            offset = next;
            continue;
        }

        let object_id = data[offset + 1];
        let raw = &data[offset + 2..next];
        let format = match control >> 5 {
            0 => Some(NumberFormat::Unsigned),
            1 => Some(NumberFormat::Signed),
            _ => None,
        };

        match (schema::lookup(object_id), format) {
            (Some(measurement), Some(format)) if raw.len() <= 8 => {
                objects.store(measurement, read_int(raw, format));
            }
            _ => debug!(object_id, control, "Skipping BTHome V1 object"),
        }
        offset = next;
    }

    objects
}

/// Plain BTHome V1 (UUID 0x181C).
pub fn decode_v1(payload: &[u8]) -> DecodeResult {
    Ok(Some(
        decode_v1_objects(payload).into_decoded("BTHome V1", None),
    ))
}

/// Encrypted BTHome V1 (UUID 0x181E).
pub fn decode_v1_encrypted(payload: &[u8], ctx: &DecodeContext<'_>) -> DecodeResult {
    let decrypted = crypto::decrypt(
        ctx.keys,
        &ctx.address,
        NonceLayout::BtHomeV1 {
            uuid: UUID_V1_ENCRYPTED,
        },
        payload,
    )?;
    Ok(Some(
        decode_v1_objects(&decrypted.plaintext)
            .into_decoded("BTHome V1 (encrypted)", Some(decrypted.counter)),
    ))
}

/// BTHome V2 (UUID 0xFCD2), plain or encrypted per the device info byte.
pub fn decode_v2(payload: &[u8], ctx: &DecodeContext<'_>) -> DecodeResult {
    let Some((&device_info, data)) = payload.split_first() else {
        return Err(DecodeError::InvalidData(
            "BTHome V2 payload without device info".into(),
        ));
    };

    let version = device_info >> VERSION_SHIFT;
    if version != 2 {
        return Err(DecodeError::UnsupportedFormat(format!(
            "BTHome device info declares version {version}"
        )));
    }
    if device_info & FLAG_TRIGGER_BASED != 0 {
        debug!(mac = %ctx.address, "Trigger based BTHome device");
    }

    if device_info & FLAG_ENCRYPTED == 0 {
        return Ok(Some(decode_objects(data).into_decoded("BTHome V2", None)));
    }

    let decrypted = crypto::decrypt(
        ctx.keys,
        &ctx.address,
        NonceLayout::BtHomeV2 {
            uuid: UUID_V2,
            device_info,
        },
        data,
    )?;
    Ok(Some(
        decode_objects(&decrypted.plaintext)
            .into_decoded("BTHome V2 (encrypted)", Some(decrypted.counter)),
    ))
}
