//! Vendor selection from the AD elements of a report.
//!
//! Two static tables map a manufacturer id or a service UUID to a [`Vendor`].
//! Manufacturer ids are tried first, then service data, then service UUID
//! lists; the first hit wins. Jaalee iBeacon frames are left to the Jaalee
//! service data sent alongside them.

use super::{Vendor, jaalee};
use crate::ad::{AdElements, ServiceUuid};

/// Company identifier -> strategy.
pub static MANUFACTURER_IDS: &[(u16, Vendor)] = &[
    (0x004C, Vendor::IBeacon),
    (0x0499, Vendor::Ruuvi),
    (0x06E8, Vendor::Almendo),
];

/// 16-bit service UUID -> strategy. 128-bit UUIDs on the Bluetooth base UUID
/// are looked up through their 16-bit alias.
pub static SERVICE_UUIDS: &[(u16, Vendor)] = &[
    (0x1000, Vendor::Moat),
    (0x181C, Vendor::BtHomeV1),
    (0x181E, Vendor::BtHomeV1Encrypted),
    (0xF525, Vendor::Jaalee),
    (0xFCD2, Vendor::BtHomeV2),
];

/// What made dispatch pick a vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKey {
    ManufacturerId(u16),
    ServiceData(ServiceUuid),
    ServiceUuidList(ServiceUuid),
}

/// Selected strategy plus the payload it should decode.
///
/// For manufacturer data the payload follows the company id; for service data
/// it follows the UUID. A UUID-list match borrows the payload of a service data
/// element with the same UUID, or is empty when there is none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    pub vendor: Vendor,
    pub key: MatchKey,
    pub payload: &'a [u8],
}

fn by_manufacturer(id: u16, payload: &[u8]) -> Option<Vendor> {
    let vendor = MANUFACTURER_IDS
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, vendor)| *vendor)?;
    if vendor == Vendor::IBeacon && jaalee::is_beacon_frame(payload) {
        return None;
    }
    Some(vendor)
}

fn by_service_uuid(uuid: ServiceUuid) -> Option<Vendor> {
    match uuid.shortened() {
        ServiceUuid::Uuid16(short) => SERVICE_UUIDS
            .iter()
            .find(|(known, _)| *known == short)
            .map(|(_, vendor)| *vendor),
        ServiceUuid::Uuid128(_) => None,
    }
}

/// Pick the decode strategy for a report. `None` means no vendor claims it.
pub fn select(elements: AdElements<'_>) -> Option<Selection<'_>> {
    let manufacturer = elements.clone().find_map(|element| {
        let id = element.manufacturer_id()?;
        let payload = element.manufacturer_payload()?;
        Some(Selection {
            vendor: by_manufacturer(id, payload)?,
            key: MatchKey::ManufacturerId(id),
            payload,
        })
    });
    if manufacturer.is_some() {
        return manufacturer;
    }

    let service_data = elements.clone().find_map(|element| {
        let (uuid, payload) = element.service_data()?;
        Some(Selection {
            vendor: by_service_uuid(uuid)?,
            key: MatchKey::ServiceData(uuid),
            payload,
        })
    });
    if service_data.is_some() {
        return service_data;
    }

    elements.clone().find_map(|element| {
        element.service_uuids().into_iter().find_map(|uuid| {
            let vendor = by_service_uuid(uuid)?;
            let payload = elements
                .clone()
                .filter_map(|e| e.service_data())
                .find(|(data_uuid, _)| data_uuid.shortened() == uuid.shortened())
                .map(|(_, payload)| payload)
                .unwrap_or(&[]);
            Some(Selection {
                vendor,
                key: MatchKey::ServiceUuidList(uuid),
                payload,
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ad;

    #[test]
    fn test_select_by_service_data() {
        let data = hex::decode("02010609161C18020009020161").unwrap();
        let selection = select(ad::parse(&data)).unwrap();
        assert_eq!(selection.vendor, Vendor::BtHomeV1);
        assert_eq!(
            selection.key,
            MatchKey::ServiceData(ServiceUuid::Uuid16(0x181C))
        );
        assert_eq!(selection.payload, &[0x02, 0x00, 0x09, 0x02, 0x01, 0x61]);
    }

    #[test]
    fn test_select_by_manufacturer_id() {
        let data = hex::decode("0201060AFF9904050102030405").unwrap();
        let selection = select(ad::parse(&data)).unwrap();
        assert_eq!(selection.vendor, Vendor::Ruuvi);
        assert_eq!(selection.key, MatchKey::ManufacturerId(0x0499));
        assert_eq!(selection.payload, &[0x05, 0x01, 0x02, 0x03, 0x04, 0x05]);
    }

    #[test]
    fn test_manufacturer_id_takes_precedence() {
        // BTHome V2 service data first, Ruuvi manufacturer data second
        let data = hex::decode("0616D2FC400161").unwrap();
        let mut both = data.clone();
        both.extend(hex::decode("05FF99040501").unwrap());
        let selection = select(ad::parse(&both)).unwrap();
        assert_eq!(selection.vendor, Vendor::Ruuvi);

        let selection = select(ad::parse(&data)).unwrap();
        assert_eq!(selection.vendor, Vendor::BtHomeV2);
    }

    #[test]
    fn test_unknown_manufacturer_falls_through_to_service_data() {
        let data = hex::decode("05FF34120102").unwrap();
        let mut both = data.clone();
        both.extend(hex::decode("0616D2FC400161").unwrap());
        let selection = select(ad::parse(&both)).unwrap();
        assert_eq!(selection.vendor, Vendor::BtHomeV2);
        assert_eq!(selection.payload, &[0x40, 0x01, 0x61]);
    }

    #[test]
    fn test_jaalee_beacon_defers_to_service_data() {
        let data = hex::decode(concat!(
            "0e1625f560138581ff9fd04f105a3e",
            "1bff4c000215ebefd08370a247c89837e7b5634df5254f105a3ecb60",
        ))
        .unwrap();
        let selection = select(ad::parse(&data)).unwrap();
        assert_eq!(selection.vendor, Vendor::Jaalee);
        assert_eq!(
            selection.key,
            MatchKey::ServiceData(ServiceUuid::Uuid16(0xF525))
        );
        assert_eq!(selection.payload.len(), 11);

        let beacon = hex::decode("1AFF4C000215fda50693a4e24fb1afcfc6eb07647825271a0b0ec5").unwrap();
        assert_eq!(select(ad::parse(&beacon)).unwrap().vendor, Vendor::IBeacon);
    }

    #[test]
    fn test_select_by_128_bit_service_data() {
        let mut data = vec![0x13, 0x21];
        data.extend_from_slice(&0x0000_FCD2_0000_1000_8000_0080_5F9B_34FB_u128.to_le_bytes());
        data.extend_from_slice(&[0x40, 0x01]);
        let selection = select(ad::parse(&data)).unwrap();
        assert_eq!(selection.vendor, Vendor::BtHomeV2);
        assert_eq!(selection.payload, &[0x40, 0x01]);
    }

    #[test]
    fn test_select_by_uuid_list() {
        let data = hex::decode("0303D2FC").unwrap();
        let selection = select(ad::parse(&data)).unwrap();
        assert_eq!(selection.vendor, Vendor::BtHomeV2);
        assert_eq!(
            selection.key,
            MatchKey::ServiceUuidList(ServiceUuid::Uuid16(0xFCD2))
        );
        assert!(selection.payload.is_empty());
    }

    #[test]
    fn test_no_match() {
        let data = hex::decode("0201060709424D45323830").unwrap();
        assert_eq!(select(ad::parse(&data)), None);
        assert_eq!(select(ad::parse(&[])), None);
    }
}
