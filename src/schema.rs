//! BTHome measurement object table.
//!
//! Maps an object id to how its value is laid out on the wire and what it
//! means. The table is a plain `static` slice sorted by id; every decode call
//! shares it read-only.

/// Integer encoding of an object's raw bytes (always little-endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    Unsigned,
    Signed,
}

/// Decode rule for one BTHome object id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementType {
    pub object_id: u8,
    /// Metric name used in the output record
    pub name: &'static str,
    pub unit: Option<&'static str>,
    /// Exact number of data bytes following the object id
    pub data_length: usize,
    pub format: NumberFormat,
    pub factor: f64,
    /// Binary sensors decode to a boolean instead of a number
    pub binary: bool,
}

/// Object id of the packet counter. Decoded into the `packet` field rather
/// than a metric.
pub const PACKET_ID: u8 = 0x00;

impl MeasurementType {
    const fn new(object_id: u8, name: &'static str) -> Self {
        Self {
            object_id,
            name,
            unit: None,
            data_length: 1,
            format: NumberFormat::Unsigned,
            factor: 1.0,
            binary: false,
        }
    }

    const fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    const fn len(mut self, data_length: usize) -> Self {
        self.data_length = data_length;
        self
    }

    const fn signed(mut self) -> Self {
        self.format = NumberFormat::Signed;
        self
    }

    const fn factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    const fn binary(mut self) -> Self {
        self.binary = true;
        self
    }

    /// Number of decimal places implied by the scale factor (0.01 -> 2).
    pub fn precision(&self) -> i32 {
        let mut scaled = self.factor;
        for decimals in 0..6 {
            if (scaled - scaled.round()).abs() < 1e-9 {
                return decimals;
            }
            scaled *= 10.0;
        }
        6
    }

    /// Apply factor and rounding to a raw integer value.
    pub fn scale(&self, raw: i64) -> f64 {
        let pow = 10f64.powi(self.precision());
        (raw as f64 * self.factor * pow).round() / pow
    }
}

type M = MeasurementType;

pub static MEASUREMENT_TYPES: &[MeasurementType] = &[
    M::new(0x00, "packet"),
    M::new(0x01, "battery").unit("%"),
    M::new(0x02, "temperature").unit("°C").len(2).signed().factor(0.01),
    M::new(0x03, "humidity").unit("%").len(2).factor(0.01),
    M::new(0x04, "pressure").unit("mbar").len(3).factor(0.01),
    M::new(0x05, "illuminance").unit("lux").len(3).factor(0.01),
    M::new(0x06, "weight").unit("kg").len(2).factor(0.01),
    M::new(0x07, "weight").unit("lbs").len(2).factor(0.01),
    M::new(0x08, "dewpoint").unit("°C").len(2).signed().factor(0.01),
    M::new(0x09, "count").unit("1"),
    M::new(0x0A, "energy").unit("kWh").len(3).factor(0.001),
    M::new(0x0B, "power").unit("W").len(3).factor(0.01),
    M::new(0x0C, "voltage").unit("V").len(2).factor(0.001),
    M::new(0x0D, "pm2.5").unit("µg/m³").len(2),
    M::new(0x0E, "pm10").unit("µg/m³").len(2),
    M::new(0x0F, "binary").binary(),
    M::new(0x10, "switch").binary(),
    M::new(0x11, "opening").binary(),
    M::new(0x12, "co2").unit("ppm").len(2),
    M::new(0x13, "tvoc").unit("µg/m³").len(2),
    M::new(0x14, "moisture").unit("%").len(2).factor(0.01),
    M::new(0x15, "battery_low").binary(),
    M::new(0x16, "battery_charging").binary(),
    M::new(0x17, "carbon_monoxide").binary(),
    M::new(0x18, "cold").binary(),
    M::new(0x19, "connectivity").binary(),
    M::new(0x1A, "door").binary(),
    M::new(0x1B, "garage_door").binary(),
    M::new(0x1C, "gas").binary(),
    M::new(0x1D, "heat").binary(),
    M::new(0x1E, "light").binary(),
    M::new(0x1F, "lock").binary(),
    M::new(0x20, "moisture_detected").binary(),
    M::new(0x21, "motion").binary(),
    M::new(0x22, "moving").binary(),
    M::new(0x23, "occupancy").binary(),
    M::new(0x24, "plug").binary(),
    M::new(0x25, "presence").binary(),
    M::new(0x26, "problem").binary(),
    M::new(0x27, "running").binary(),
    M::new(0x28, "safety").binary(),
    M::new(0x29, "smoke detector").binary(),
    M::new(0x2A, "sound").binary(),
    M::new(0x2B, "tamper").binary(),
    M::new(0x2C, "vibration").binary(),
    M::new(0x2D, "window").binary(),
    M::new(0x2E, "humidity").unit("%"),
    M::new(0x2F, "moisture").unit("%"),
    M::new(0x3D, "count").len(2),
    M::new(0x3E, "count").len(4),
    M::new(0x3F, "rotation").unit("°").len(2).signed().factor(0.1),
    M::new(0x40, "distance").unit("mm").len(2),
    M::new(0x41, "distance").unit("m").len(2).factor(0.1),
    M::new(0x42, "duration").unit("s").len(3).factor(0.001),
    M::new(0x43, "current").unit("A").len(2).factor(0.001),
    M::new(0x44, "speed").unit("m/s").len(2).factor(0.01),
    M::new(0x45, "temperature").unit("°C").len(2).signed().factor(0.1),
    M::new(0x46, "uv_index").factor(0.1),
    M::new(0x47, "volume").unit("L").len(2).factor(0.1),
    M::new(0x48, "volume").unit("mL").len(2),
    M::new(0x49, "volume_flow_rate").unit("m³/hr").len(2).factor(0.001),
    M::new(0x4A, "voltage").unit("V").len(2).factor(0.1),
    M::new(0x4B, "gas").unit("m³").len(3).factor(0.001),
    M::new(0x4C, "gas").unit("m³").len(4).factor(0.001),
    M::new(0x4D, "energy").unit("kWh").len(4).factor(0.001),
    M::new(0x4E, "volume").unit("L").len(4).factor(0.001),
    M::new(0x4F, "water").unit("L").len(4).factor(0.001),
    M::new(0x50, "timestamp").unit("s").len(4),
    M::new(0x51, "acceleration").unit("m/s²").len(2).factor(0.001),
    M::new(0x52, "gyroscope").unit("°/s").len(2).factor(0.001),
    M::new(0x55, "volume_storage").unit("L").len(4).factor(0.001),
    M::new(0x56, "conductivity").unit("µS/cm").len(2),
    M::new(0x57, "temperature").unit("°C").signed(),
    M::new(0x58, "temperature").unit("°C").signed().factor(0.35),
    M::new(0x59, "count").signed(),
    M::new(0x5A, "count").len(2).signed(),
    M::new(0x5B, "count").len(4).signed(),
    M::new(0x5C, "power").unit("W").len(4).signed().factor(0.01),
    M::new(0x5D, "current").unit("A").len(2).signed().factor(0.001),
    M::new(0x5E, "direction").unit("°").len(2).factor(0.01),
    M::new(0x5F, "precipitation").unit("mm").len(2).factor(0.1),
    M::new(0x60, "channel"),
];

/// Look up the decode rule for an object id.
pub fn lookup(object_id: u8) -> Option<&'static MeasurementType> {
    MEASUREMENT_TYPES
        .binary_search_by_key(&object_id, |m| m.object_id)
        .ok()
        .map(|idx| &MEASUREMENT_TYPES[idx])
}
