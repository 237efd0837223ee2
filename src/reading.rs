//! Decoded readings and the result normalizer.

use crate::mac_address::MacAddress;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel published when an advertisement carries no packet counter.
pub const NO_PACKET_ID: &str = "no packet id";

/// Which output stream a reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Sensor,
    Tracker,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Sensor => write!(f, "sensor"),
            Category::Tracker => write!(f, "tracker"),
        }
    }
}

/// A single decoded value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Identifiers such as an iBeacon UUID
    Text(String),
}

impl MetricValue {
    /// Integral values stay integers so `97` is not published as `97.0`.
    pub fn from_scaled(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            MetricValue::Int(value as i64)
        } else {
            MetricValue::Float(value)
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Int(v) => Some(*v as f64),
            MetricValue::Float(v) => Some(*v),
            MetricValue::Bool(_) | MetricValue::Text(_) => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{v}"),
            MetricValue::Float(v) => write!(f, "{v}"),
            MetricValue::Bool(v) => write!(f, "{v}"),
            MetricValue::Text(v) => write!(f, "{v}"),
        }
    }
}

/// Metric name -> value, ordered for stable output.
pub type Metrics = BTreeMap<String, MetricValue>;

/// Packet counter of an advertisement, or its absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PacketId {
    Id(u32),
    #[default]
    None,
}

impl Serialize for PacketId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PacketId::Id(id) => serializer.serialize_u32(*id),
            PacketId::None => serializer.serialize_str(NO_PACKET_ID),
        }
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketId::Id(id) => write!(f, "{id}"),
            PacketId::None => write!(f, "{NO_PACKET_ID}"),
        }
    }
}

/// What a vendor strategy hands to the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub firmware: String,
    pub device_type: String,
    pub metrics: Metrics,
    pub packet: PacketId,
    /// Device address carried inside the payload, when the format has one
    pub address: Option<MacAddress>,
}

impl Decoded {
    pub fn new(firmware: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            firmware: firmware.into(),
            device_type: device_type.into(),
            metrics: Metrics::new(),
            packet: PacketId::None,
            address: None,
        }
    }

    pub fn insert(&mut self, name: &str, value: MetricValue) {
        self.metrics.insert(name.to_string(), value);
    }

    /// Insert a float rounded to `decimals` places.
    pub fn insert_rounded(&mut self, name: &str, value: f64, decimals: i32) {
        let pow = 10f64.powi(decimals);
        self.insert(name, MetricValue::from_scaled((value * pow).round() / pow));
    }
}

/// The canonical output record.
///
/// Serializes to a flat map: `mac`, `rssi`, `firmware`, `type`, `packet`,
/// `data` and one key per metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub mac: MacAddress,
    pub rssi: i8,
    pub firmware: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub packet: PacketId,
    pub data: bool,
    #[serde(flatten)]
    pub metrics: Metrics,
}

impl Reading {
    /// Recompute derived fields. Applying it twice changes nothing.
    pub fn normalized(mut self) -> Self {
        self.data = !self.metrics.is_empty();
        self
    }

    /// Names of every field the record serializes to.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        ["mac", "rssi", "firmware", "type", "packet", "data"]
            .into_iter()
            .chain(self.metrics.keys().map(String::as_str))
    }
}

/// Assemble the canonical reading and place it on the side of its category.
pub fn normalize(
    mac: MacAddress,
    rssi: i8,
    category: Category,
    decoded: Decoded,
) -> (Option<Reading>, Option<Reading>) {
    let reading = Reading {
        mac,
        rssi,
        firmware: decoded.firmware,
        device_type: decoded.device_type,
        packet: decoded.packet,
        data: false,
        metrics: decoded.metrics,
    }
    .normalized();

    match category {
        Category::Sensor => (Some(reading), None),
        Category::Tracker => (None, Some(reading)),
    }
}
