//! Advertising Data (AD) element parser.
//!
//! An advertising payload is a run of length-prefixed structures: one length
//! byte `L`, then `L` bytes holding the AD type followed by its value.

/// Bluetooth base UUID (`0000xxxx-0000-1000-8000-00805F9B34FB`) with the
/// 16-bit slot zeroed.
const BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;
const BASE_UUID_MASK: u128 = !(0xFFFF_u128 << 96);

/// AD element types the decoders care about. Anything else is kept as
/// [`AdType::Other`] so dispatch can still look at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdType {
    Flags,
    IncompleteUuid16List,
    CompleteUuid16List,
    IncompleteUuid128List,
    CompleteUuid128List,
    ShortenedLocalName,
    CompleteLocalName,
    TxPowerLevel,
    ServiceData16,
    ServiceData128,
    ManufacturerData,
    Other(u8),
}

impl From<u8> for AdType {
    fn from(value: u8) -> Self {
        match value {
            0x01 => AdType::Flags,
            0x02 => AdType::IncompleteUuid16List,
            0x03 => AdType::CompleteUuid16List,
            0x06 => AdType::IncompleteUuid128List,
            0x07 => AdType::CompleteUuid128List,
            0x08 => AdType::ShortenedLocalName,
            0x09 => AdType::CompleteLocalName,
            0x0A => AdType::TxPowerLevel,
            0x16 => AdType::ServiceData16,
            0x21 => AdType::ServiceData128,
            0xFF => AdType::ManufacturerData,
            other => AdType::Other(other),
        }
    }
}

impl From<AdType> for u8 {
    fn from(value: AdType) -> Self {
        match value {
            AdType::Flags => 0x01,
            AdType::IncompleteUuid16List => 0x02,
            AdType::CompleteUuid16List => 0x03,
            AdType::IncompleteUuid128List => 0x06,
            AdType::CompleteUuid128List => 0x07,
            AdType::ShortenedLocalName => 0x08,
            AdType::CompleteLocalName => 0x09,
            AdType::TxPowerLevel => 0x0A,
            AdType::ServiceData16 => 0x16,
            AdType::ServiceData128 => 0x21,
            AdType::ManufacturerData => 0xFF,
            AdType::Other(other) => other,
        }
    }
}

/// A service UUID as advertised, either in its 16-bit or 128-bit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceUuid {
    Uuid16(u16),
    Uuid128(u128),
}

impl ServiceUuid {
    /// Reduce a 128-bit UUID built on the Bluetooth base UUID to its 16-bit
    /// alias, so both spellings hit the same dispatch entry.
    pub fn shortened(self) -> Self {
        match self {
            ServiceUuid::Uuid128(uuid)
                if uuid & BASE_UUID_MASK == BASE_UUID && (uuid >> 112) == 0 =>
            {
                ServiceUuid::Uuid16((uuid >> 96) as u16)
            }
            other => other,
        }
    }
}

/// One AD structure borrowed from the advertising payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdElement<'a> {
    pub ad_type: AdType,
    pub value: &'a [u8],
}

impl<'a> AdElement<'a> {
    /// Company identifier of a manufacturer-specific data element.
    pub fn manufacturer_id(&self) -> Option<u16> {
        match (self.ad_type, self.value) {
            (AdType::ManufacturerData, [lo, hi, ..]) => Some(u16::from_le_bytes([*lo, *hi])),
            _ => None,
        }
    }

    /// Vendor payload that follows the company identifier.
    pub fn manufacturer_payload(&self) -> Option<&'a [u8]> {
        self.manufacturer_id().map(|_| &self.value[2..])
    }

    /// Service UUID and payload of a service data element.
    pub fn service_data(&self) -> Option<(ServiceUuid, &'a [u8])> {
        match self.ad_type {
            AdType::ServiceData16 if self.value.len() >= 2 => Some((
                ServiceUuid::Uuid16(u16::from_le_bytes([self.value[0], self.value[1]])),
                &self.value[2..],
            )),
            AdType::ServiceData128 if self.value.len() >= 16 => {
                let mut uuid = [0u8; 16];
                uuid.copy_from_slice(&self.value[..16]);
                Some((
                    ServiceUuid::Uuid128(u128::from_le_bytes(uuid)),
                    &self.value[16..],
                ))
            }
            _ => None,
        }
    }

    /// UUIDs listed by a 16-bit or 128-bit service UUID list element.
    pub fn service_uuids(&self) -> Vec<ServiceUuid> {
        match self.ad_type {
            AdType::IncompleteUuid16List | AdType::CompleteUuid16List => self
                .value
                .chunks_exact(2)
                .map(|c| ServiceUuid::Uuid16(u16::from_le_bytes([c[0], c[1]])))
                .collect(),
            AdType::IncompleteUuid128List | AdType::CompleteUuid128List => self
                .value
                .chunks_exact(16)
                .map(|c| {
                    let mut uuid = [0u8; 16];
                    uuid.copy_from_slice(c);
                    ServiceUuid::Uuid128(u128::from_le_bytes(uuid))
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Shortened or complete local name, if it is valid UTF-8.
    pub fn local_name(&self) -> Option<&'a str> {
        match self.ad_type {
            AdType::ShortenedLocalName | AdType::CompleteLocalName => {
                std::str::from_utf8(self.value).ok()
            }
            _ => None,
        }
    }
}

/// Lazy iterator over the AD structures of a payload.
///
/// Cloning copies only a slice and an offset, so callers can walk the same
/// payload several times.
#[derive(Debug, Clone)]
pub struct AdElements<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> AdElements<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }
}

impl<'a> Iterator for AdElements<'a> {
    type Item = AdElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.data.get(self.offset..)?;
        let (&len, rest) = rest.split_first()?;
        let len = len as usize;

        // Zero length marks the end of significant data; a length past the
        // buffer is a truncated structure. Either way, stop quietly.
        if len == 0 || len > rest.len() {
            self.offset = self.data.len();
            return None;
        }

        self.offset += 1 + len;
        Some(AdElement {
            ad_type: AdType::from(rest[0]),
            value: &rest[1..len],
        })
    }
}

/// Split an advertising payload into its AD elements.
pub fn parse(data: &[u8]) -> AdElements<'_> {
    AdElements::new(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Vec<u8> {
        hex::decode("02010609161C18020009020161").unwrap()
    }

    #[test]
    fn test_parse_elements() {
        let data = payload();
        let elements: Vec<_> = parse(&data).collect();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].ad_type, AdType::Flags);
        assert_eq!(elements[0].value, &[0x06]);
        assert_eq!(elements[1].ad_type, AdType::ServiceData16);
        assert_eq!(
            elements[1].service_data(),
            Some((
                ServiceUuid::Uuid16(0x181C),
                &[0x02, 0x00, 0x09, 0x02, 0x01, 0x61][..]
            ))
        );
    }

    #[test]
    fn test_iterator_is_restartable() {
        let data = payload();
        let elements = parse(&data);
        assert_eq!(elements.clone().count(), 2);
        assert_eq!(elements.count(), 2);
    }

    #[test]
    fn test_truncated_element_stops_without_error() {
        // Second element claims 9 bytes but only 3 remain
        let data = hex::decode("020106091618").unwrap();
        let elements: Vec<_> = parse(&data).collect();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].ad_type, AdType::Flags);
    }

    #[test]
    fn test_zero_length_terminates() {
        let data = hex::decode("020106000000").unwrap();
        assert_eq!(parse(&data).count(), 1);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(parse(&[]).count(), 0);
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let data = hex::decode("03AB0102020A09").unwrap();
        let elements: Vec<_> = parse(&data).collect();
        assert_eq!(elements[0].ad_type, AdType::Other(0xAB));
        assert_eq!(elements[0].value, &[0x01, 0x02]);
        assert_eq!(u8::from(elements[0].ad_type), 0xAB);
        assert_eq!(elements[1].ad_type, AdType::TxPowerLevel);
    }

    #[test]
    fn test_manufacturer_id() {
        let data = hex::decode("05FF99040501").unwrap();
        let element = parse(&data).next().unwrap();
        assert_eq!(element.manufacturer_id(), Some(0x0499));
        assert_eq!(element.manufacturer_payload(), Some(&[0x05, 0x01][..]));
    }

    #[test]
    fn test_manufacturer_data_too_short() {
        let data = hex::decode("02FF99").unwrap();
        let element = parse(&data).next().unwrap();
        assert_eq!(element.manufacturer_id(), None);
    }

    #[test]
    fn test_uuid16_list() {
        let data = hex::decode("0503D2FC1C18").unwrap();
        let element = parse(&data).next().unwrap();
        assert_eq!(
            element.service_uuids(),
            vec![ServiceUuid::Uuid16(0xFCD2), ServiceUuid::Uuid16(0x181C)]
        );
    }

    #[test]
    fn test_uuid128_shortened_to_alias() {
        let uuid = ServiceUuid::Uuid128(0x0000_FCD2_0000_1000_8000_0080_5F9B_34FB);
        assert_eq!(uuid.shortened(), ServiceUuid::Uuid16(0xFCD2));

        let vendor = ServiceUuid::Uuid128(0xEBEF_D083_70A2_47C8_9837_E7B5_634D_F525);
        assert_eq!(vendor.shortened(), vendor);
    }

    #[test]
    fn test_uuid128_list_little_endian() {
        let mut data = vec![0x11, 0x07];
        data.extend_from_slice(&0x0000_181C_0000_1000_8000_0080_5F9B_34FB_u128.to_le_bytes());
        let element = parse(&data).next().unwrap();
        assert_eq!(
            element.service_uuids()[0].shortened(),
            ServiceUuid::Uuid16(0x181C)
        );
    }

    #[test]
    fn test_local_name() {
        let data = hex::decode("0709424D45323830").unwrap();
        let element = parse(&data).next().unwrap();
        assert_eq!(element.local_name(), Some("BME280"));
    }
}
