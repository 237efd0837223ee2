//! InfluxDB line protocol output formatter.

use crate::output::OutputFormatter;
use crate::reading::{Category, MetricValue, PacketId, Reading};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
#[cfg(test)]
use std::time::Duration;
use std::time::SystemTime;

/// Field values for InfluxDB line protocol
#[derive(Debug, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Float(num) => write!(f, "{num}"),
            FieldValue::Integer(num) => write!(f, "{num}i"),
            FieldValue::Boolean(b) => write!(f, "{b}"),
            FieldValue::String(s) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
        }
    }
}

impl From<&MetricValue> for FieldValue {
    fn from(value: &MetricValue) -> Self {
        match value {
            MetricValue::Int(v) => FieldValue::Integer(*v),
            MetricValue::Float(v) => FieldValue::Float(*v),
            MetricValue::Bool(v) => FieldValue::Boolean(*v),
            MetricValue::Text(v) => FieldValue::String(v.clone()),
        }
    }
}

/// Data point in InfluxDB line protocol
#[derive(Debug)]
pub struct DataPoint {
    pub measurement: String,
    pub tag_set: BTreeMap<String, String>,
    pub field_set: BTreeMap<String, FieldValue>,
    pub timestamp: Option<SystemTime>,
}

/// Escape commas, equals signs and spaces in tag keys, tag values and field
/// keys.
fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for c in key.chars() {
        if matches!(c, ',' | '=' | ' ') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn fmt_tags(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    for (key, value) in data_point.tag_set.iter() {
        write!(fmt, ",{}={}", escape_key(key), escape_key(value))?;
    }
    Ok(())
}

fn fmt_fields(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    let mut first = true;
    for (key, value) in data_point.field_set.iter() {
        if first {
            first = false;
        } else {
            write!(fmt, ",")?;
        }
        write!(fmt, "{}={}", escape_key(key), value)?;
    }
    Ok(())
}

fn fmt_timestamp(data_point: &DataPoint, fmt: &mut fmt::Formatter) -> fmt::Result {
    if let Some(nanos) = data_point
        .timestamp
        .and_then(|time| time.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|since_epoch| since_epoch.as_nanos())
    {
        write!(fmt, " {}", nanos)?;
    }
    Ok(())
}

impl fmt::Display for DataPoint {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", escape_key(&self.measurement))?;
        fmt_tags(self, fmt)?;
        write!(fmt, " ")?;
        fmt_fields(self, fmt)?;
        fmt_timestamp(self, fmt)
    }
}

/// InfluxDB line protocol formatter.
///
/// Tags: `mac`, `type`, `firmware`, `category`. Fields: every metric plus
/// `rssi` and, when the advert carried one, `packet`.
pub struct InfluxDbFormatter {
    /// The measurement name in InfluxDB
    measurement_name: String,
}

impl InfluxDbFormatter {
    /// Create a new InfluxDB formatter.
    pub fn new(measurement_name: String) -> Self {
        Self { measurement_name }
    }

    fn tag_set(&self, reading: &Reading, category: Category) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        tags.insert("mac".to_string(), reading.mac.to_string());
        tags.insert("type".to_string(), reading.device_type.clone());
        tags.insert("firmware".to_string(), reading.firmware.clone());
        tags.insert("category".to_string(), category.to_string());
        tags
    }

    fn field_set(&self, reading: &Reading) -> BTreeMap<String, FieldValue> {
        let mut fields: BTreeMap<String, FieldValue> = reading
            .metrics
            .iter()
            .map(|(name, value)| (name.clone(), FieldValue::from(value)))
            .collect();

        fields.insert("rssi".into(), FieldValue::Integer(i64::from(reading.rssi)));
        if let PacketId::Id(packet) = reading.packet {
            fields.insert("packet".into(), FieldValue::Integer(i64::from(packet)));
        }
        fields
    }

    fn to_data_point(
        &self,
        reading: &Reading,
        category: Category,
        timestamp: SystemTime,
    ) -> DataPoint {
        DataPoint {
            measurement: self.measurement_name.clone(),
            tag_set: self.tag_set(reading, category),
            field_set: self.field_set(reading),
            timestamp: Some(timestamp),
        }
    }
}

impl OutputFormatter for InfluxDbFormatter {
    fn format(&self, reading: &Reading, category: Category) -> io::Result<String> {
        Ok(format!(
            "{}",
            self.to_data_point(reading, category, SystemTime::now())
        ))
    }
}
